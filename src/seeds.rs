//! Seed data: the built-in glossary and the last-resort quiz questions.
//!
//! These guarantee the assistant is useful even without external config or a generator.

use crate::glossary::{GlossaryPhrase, GlossaryTerm};

fn term(term: &str, definition: &str, category: &str, examples: &[&str]) -> GlossaryTerm {
  GlossaryTerm {
    term: term.into(),
    definition: definition.into(),
    category: category.into(),
    examples: examples.iter().map(|e| e.to_string()).collect(),
  }
}

/// Literary and archaic vocabulary shipped with the assistant.
pub fn seed_terms() -> Vec<GlossaryTerm> {
  vec![
    term(
      "облом",
      "Неудача, крушение планов; в литературе также намёк на обломовщину — апатию и бездействие",
      "разговорное",
      &["«Вот так облом», — подумал он."],
    ),
    term(
      "фрак",
      "Мужской парадный костюм с вырезанными спереди и длинными узкими фалдами сзади",
      "одежда",
      &["Онегин в модном фраке отправился на бал."],
    ),
    term(
      "вельми",
      "Очень, весьма (устар.)",
      "архаизм",
      &["Вельми понеже..."],
    ),
    term(
      "исправник",
      "Начальник уездной полиции в Российской империи",
      "должность",
      &["Исправник приехал в деревню разбирать дело."],
    ),
    term(
      "метафора",
      "Перенос свойств одного предмета на другой на основании их сходства",
      "литературный термин",
      &["«Горит восток зарёю новой» (Пушкин)."],
    ),
    term(
      "барыня",
      "Помещица, госпожа; вежливое обращение к женщине из господ",
      "сословие",
      &["Барыня приказала подать чаю."],
    ),
    term(
      "ямщик",
      "Кучер почтовой или наёмной повозки",
      "профессия",
      &["«Ямщик, не гони лошадей»."],
    ),
    term(
      "целковый",
      "Серебряный рубль, рублёвая монета",
      "деньги",
      &["Дал ему целковый на водку."],
    ),
    term(
      "дабы",
      "Чтобы (устар., книжн.)",
      "архаизм",
      &["Дабы не было недоразумений..."],
    ),
    term(
      "десница",
      "Правая рука (устар., высок.)",
      "архаизм",
      &["Поднял десницу для благословения."],
    ),
    term(
      "гипербола",
      "Художественное преувеличение для усиления выразительности",
      "литературный термин",
      &["«В сто сорок солнц закат пылал» (Маяковский)."],
    ),
    term(
      "приказчик",
      "Служащий у купца или помещика, ведавший торговлей или хозяйством",
      "профессия",
      &["Приказчик отпустил товар в долг."],
    ),
  ]
}

/// Well-known quotations and idioms with ready explanations.
pub fn seed_phrases() -> Vec<GlossaryPhrase> {
  vec![
    GlossaryPhrase {
      text: "В человеке всё должно быть прекрасно".into(),
      explanation: "Слова доктора Астрова из пьесы Чехова «Дядя Ваня» о гармонии внешнего и внутреннего".into(),
      modern_paraphrase: "Человек должен быть красив и снаружи, и внутри".into(),
      cultural_context: "Часто цитируется как идеал гармоничной личности, нередко с иронией".into(),
    },
    GlossaryPhrase {
      text: "К шапочному разбору".into(),
      explanation: "Опоздать, прийти к самому концу события".into(),
      modern_paraphrase: "Прийти, когда всё уже закончилось".into(),
      cultural_context: "Из обычая разбирать шапки, оставленные у входа в церковь, по окончании службы".into(),
    },
    GlossaryPhrase {
      text: "Счастливые часов не наблюдают".into(),
      explanation: "Реплика Софьи из комедии Грибоедова «Горе от ума»".into(),
      modern_paraphrase: "Когда тебе хорошо, время летит незаметно".into(),
      cultural_context: "Стала крылатой фразой о беззаботном счастье".into(),
    },
  ]
}

/// A hardcoded question: text, correct answer and wrong answers.
#[derive(Clone, Debug)]
pub struct SeedQuestion {
  pub question: &'static str,
  pub correct: &'static str,
  pub wrong: [&'static str; 3],
}

/// Absolute last-resort quiz content, used when both dictionary and glossary are unusable.
pub fn fallback_quiz_questions() -> Vec<SeedQuestion> {
  vec![
    SeedQuestion {
      question: "Что означает слово «исправник»?",
      correct: "Начальник уездной полиции в Российской империи",
      wrong: ["Духовный наставник монахов", "Староста деревни", "Военный чин"],
    },
    SeedQuestion {
      question: "Что значит выражение «к шапочному разбору»?",
      correct: "В конце, под самый конец события",
      wrong: ["К началу собрания", "В разгар спора", "Во время выборов"],
    },
    SeedQuestion {
      question: "Кто такой «старец Зосима»?",
      correct: "Духовный наставник в «Братьях Карамазовых» Достоевского",
      wrong: ["Главный герой «Войны и мира»", "Антагонист «Преступления и наказания»", "Библейский персонаж"],
    },
  ]
}
