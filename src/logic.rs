//! Request-handling layer shared by the HTTP and WebSocket handlers.
//!
//! Every inbound `{user_id, text}` goes through `handle_text`:
//!   - `Idle`: menu buttons and slash commands, anything else gets the help text
//!   - `Awaiting*`: the state is reset first, then the intent handler gets the raw text
//!
//! Handlers return `Result<Reply, String>`; an `Err` becomes a generic apology here and never
//! reaches the transport. Every reply is cut to the display budget before it leaves.

use tracing::{error, info, instrument, warn};

use crate::domain::{ConversationState, Document, Intent, Lookup, Reply};
use crate::state::AppState;
use crate::store::Export;
use crate::util::{preview, trunc_for_log, truncate_for_display};

const APOLOGY: &str = "❌ Произошла ошибка. Попробуйте еще раз.";
const UNAVAILABLE: &str = "⚠️ Сервис временно недоступен. Попробуйте позже.";

const HELP: &str = "❓ Пожалуйста, выберите функцию из меню или используйте команды:\n\
  /слово - объяснить слово\n\
  /объясни - разобрать фразу или цитату\n\
  /перескажи - пересказать текст\n\
  /герой - характеристика героя\n\
  /словарь - мой словарик\n\
  /викторина - играть\n\
  /экспорт - выгрузить словарь в CSV\n\
  /очистить - очистить словарь\n\
  /статистика - моя статистика";

const WELCOME: &str = "👋 Привет!\n\n\
  Я — Литературный Помощник 🤖\n\
  Я помогу тебе читать сложные тексты, объясню редкие слова, \
  разберу фразы и перескажу современным языком.\n\n\
  Выбери функцию из меню ниже:";

/// Labels of the main menu; the leading emoji is what the dispatcher matches on.
pub fn main_menu() -> Vec<String> {
  [
    "1️⃣ Объяснить слово",
    "2️⃣ Разобрать фразу/цитату",
    "3️⃣ Пересказать современным языком",
    "4️⃣ Характеристика героя",
    "5️⃣ Мой словарик",
    "🎲 Викторина",
  ]
  .iter()
  .map(|s| s.to_string())
  .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
  Await(Intent),
  Dictionary,
  Quiz,
  Start,
  Help,
  Export,
  Clear,
  Stats,
  Admin,
}

/// Recognize a menu button (by its emoji prefix) or a slash command (first token).
pub fn parse_command(text: &str) -> Option<Command> {
  let t = text.trim();
  let buttons = [
    ("1️⃣", Command::Await(Intent::Word)),
    ("2️⃣", Command::Await(Intent::Phrase)),
    ("3️⃣", Command::Await(Intent::Retell)),
    ("4️⃣", Command::Await(Intent::Character)),
    ("5️⃣", Command::Dictionary),
    ("🎲", Command::Quiz),
  ];
  if let Some((_, cmd)) = buttons.iter().find(|(prefix, _)| t.starts_with(prefix)) {
    return Some(*cmd);
  }

  let first = t.split_whitespace().next()?;
  // "/start@SomeBot" style suffixes
  let first = first.split('@').next().unwrap_or(first);
  let cmd = match first {
    "/слово" => Command::Await(Intent::Word),
    "/объясни" => Command::Await(Intent::Phrase),
    "/перескажи" => Command::Await(Intent::Retell),
    "/герой" => Command::Await(Intent::Character),
    "/словарь" => Command::Dictionary,
    "/викторина" => Command::Quiz,
    "/start" => Command::Start,
    "/help" => Command::Help,
    "/экспорт" => Command::Export,
    "/очистить" => Command::Clear,
    "/статистика" => Command::Stats,
    "/admin" => Command::Admin,
    _ => return None,
  };
  Some(cmd)
}

fn prompt_for(intent: Intent) -> &'static str {
  match intent {
    Intent::Word => "📝 Введите слово, которое нужно объяснить:",
    Intent::Phrase => "📖 Отправьте мне фразу, цитату или культурное понятие для объяснения:",
    Intent::Retell => "🔄 Отправьте текст для пересказа современным языком:",
    Intent::Character => "🎭 Назовите литературного героя (и, если можно, произведение):",
  }
}

fn finish(state: &AppState, mut reply: Reply) -> Reply {
  let limits = &state.config.limits;
  reply.text = truncate_for_display(&reply.text, limits.max_output_chars, &limits.truncation_marker);
  reply
}

/// Entry point for every inbound text message.
#[instrument(level = "info", skip(state, text), fields(text_len = text.len()))]
pub async fn handle_text(state: &AppState, user_id: i64, text: &str) -> Reply {
  let reply = match dispatch(state, user_id, text).await {
    Ok(r) => r,
    Err(e) => {
      error!(target: "dialog", user_id, text = %trunc_for_log(text, 50), error = %e, "handler failed");
      Reply::text(APOLOGY)
    }
  };
  finish(state, reply)
}

async fn dispatch(state: &AppState, user_id: i64, text: &str) -> Result<Reply, String> {
  // Consume the awaiting state before the handler runs, so a failing handler can't leave it set.
  let current = state.sessions.take_state(user_id).await;
  if let Some(intent) = current.intent() {
    info!(target: "dialog", user_id, ?intent, "awaited payload received");
    return run_intent(state, user_id, intent, text).await;
  }

  match parse_command(text) {
    Some(Command::Await(intent)) => {
      state.sessions.set_state(user_id, intent.awaiting_state()).await;
      Ok(Reply::text(prompt_for(intent)))
    }
    Some(Command::Dictionary) => show_dictionary(state, user_id),
    Some(Command::Quiz) => Ok(start_quiz(state, user_id).await),
    Some(Command::Start) => Ok(Reply::text(WELCOME).with_choices(main_menu())),
    Some(Command::Export) => export_dictionary(state, user_id),
    Some(Command::Clear) => clear_dictionary(state, user_id),
    Some(Command::Stats) => show_stats(state, user_id),
    Some(Command::Admin) if state.settings.admin_user_id == Some(user_id) => admin_overview(state),
    Some(Command::Admin) => {
      warn!(target: "dialog", user_id, "admin command from non-admin user");
      Ok(help())
    }
    Some(Command::Help) | None => Ok(help()),
  }
}

fn help() -> Reply {
  Reply::text(HELP).with_choices(main_menu())
}

async fn run_intent(state: &AppState, user_id: i64, intent: Intent, text: &str) -> Result<Reply, String> {
  match intent {
    Intent::Word => Ok(explain_word(state, user_id, text).await),
    Intent::Phrase => Ok(explain_phrase(state, user_id, text).await),
    Intent::Retell => Ok(retell(state, user_id, text).await),
    Intent::Character => Ok(describe_character(state, user_id, text).await),
  }
}

#[instrument(level = "info", skip(state, raw))]
pub async fn explain_word(state: &AppState, user_id: i64, raw: &str) -> Reply {
  let word = raw.trim();
  match state.source.explain_word(word).await {
    Lookup::Found(e) => {
      // The answer goes out even if the dictionary write fails.
      if !state.store.save(user_id, word, &e.stored) {
        warn!(target: "dialog", user_id, word, "explanation delivered but not saved");
      }
      info!(target: "dialog", user_id, word, source = ?e.source, "word explained");
      Reply::text(e.display)
    }
    Lookup::Unavailable => Reply::text(UNAVAILABLE),
    Lookup::NotFound | Lookup::Failed(_) => {
      info!(target: "dialog", user_id, word, "word not explained");
      Reply::text(format!("❌ Не удалось объяснить слово «{}». Попробуйте другое слово.", word))
    }
  }
}

#[instrument(level = "info", skip(state, raw), fields(phrase_len = raw.len()))]
pub async fn explain_phrase(state: &AppState, user_id: i64, raw: &str) -> Reply {
  match state.source.explain_phrase(raw).await {
    Lookup::Found(e) => {
      state.store.record_lookup(user_id);
      Reply::text(e.display)
    }
    Lookup::Unavailable => Reply::text(UNAVAILABLE),
    Lookup::NotFound | Lookup::Failed(_) => {
      Reply::text("❌ Не удалось объяснить фразу. Попробуйте сформулировать иначе.")
    }
  }
}

#[instrument(level = "info", skip(state, text), fields(text_len = text.len()))]
pub async fn retell(state: &AppState, user_id: i64, text: &str) -> Reply {
  let max = state.config.limits.max_retell_chars;
  let len = text.chars().count();
  if len > max {
    info!(target: "dialog", user_id, len, max, "retell input rejected as too long");
    return Reply::text(format!(
      "⚠️ Текст слишком длинный ({} символов). Максимум — {} символов. Отправьте фрагмент покороче.",
      len, max
    ));
  }
  match state.source.retell(text).await {
    Lookup::Found(t) => {
      state.store.record_lookup(user_id);
      Reply::text(format!("🔄 Пересказ современным языком:\n\n{}", t))
    }
    Lookup::Unavailable => Reply::text(UNAVAILABLE),
    Lookup::NotFound | Lookup::Failed(_) => {
      Reply::text("❌ Не удалось пересказать текст. Попробуйте отправить другой текст.")
    }
  }
}

#[instrument(level = "info", skip(state, name))]
pub async fn describe_character(state: &AppState, user_id: i64, name: &str) -> Reply {
  match state.source.describe_character(name).await {
    Lookup::Found(t) => {
      state.store.record_lookup(user_id);
      Reply::text(format!("🎭 {}\n\n{}", name.trim(), t))
    }
    Lookup::Unavailable => Reply::text(UNAVAILABLE),
    Lookup::NotFound | Lookup::Failed(_) => {
      Reply::text("❌ Не удалось описать героя. Попробуйте уточнить имя и произведение.")
    }
  }
}

fn show_dictionary(state: &AppState, user_id: i64) -> Result<Reply, String> {
  let page = state.config.limits.dictionary_page;
  let words = state.store.try_list(user_id, page).map_err(|e| e.to_string())?;
  if words.is_empty() {
    return Ok(Reply::text(
      "📚 Ваш словарь пока пуст!\n\n\
       Начните изучать литературу:\n\
       • Используйте /слово для объяснения терминов\n\
       • Каждое объяснённое слово сохраняется автоматически",
    ));
  }
  let total = state.store.try_count(user_id).map_err(|e| e.to_string())?;

  let mut lines = vec!["📚 Вот слова, которые вы недавно спрашивали:".to_string()];
  for (i, w) in words.iter().enumerate() {
    lines.push(format!(
      "{}. {} ({} просмотров, {})\n   └ {}",
      i + 1,
      w.word,
      w.lookup_count,
      w.last_seen.format("%Y-%m-%d"),
      preview(&w.explanation, 50)
    ));
  }
  let mut text = lines.join("\n");
  text.push_str(&format!("\n\n📊 Всего уникальных слов: {}", total));
  if total > words.len() {
    text.push_str(&format!("\n⚠️ Показано {} последних слов из {}", words.len(), total));
  }
  Ok(Reply::text(text).with_choices(vec!["/экспорт".into(), "/очистить".into()]))
}

fn export_dictionary(state: &AppState, user_id: i64) -> Result<Reply, String> {
  match state.store.try_export(user_id).map_err(|e| e.to_string())? {
    Export::Empty => Ok(Reply::text("📚 Словарь пуст, экспортировать нечего.")),
    Export::Csv(content) => {
      info!(target: "dialog", user_id, bytes = content.len(), "dictionary exported");
      Ok(Reply::text("📊 Ваш словарь в формате CSV").with_document(Document {
        filename: format!("dictionary_{}.csv", user_id),
        mime: "text/csv".into(),
        content,
      }))
    }
  }
}

/// Shared by the `/очистить` command and the HTTP clear route.
pub fn clear_dictionary(state: &AppState, user_id: i64) -> Result<Reply, String> {
  let removed = state.store.try_clear(user_id).map_err(|e| e.to_string())?;
  info!(target: "dialog", user_id, removed, "dictionary cleared");
  Ok(Reply::text(format!("🗑️ Словарь очищен. Удалено слов: {}", removed)))
}

fn show_stats(state: &AppState, user_id: i64) -> Result<Reply, String> {
  let Some(s) = state.store.try_stats(user_id).map_err(|e| e.to_string())? else {
    return Ok(Reply::text("📊 Статистики пока нет. Объясните первое слово командой /слово!"));
  };
  Ok(Reply::text(format!(
    "📊 Ваша статистика:\n\n\
     🔍 Всего запросов: {}\n\
     📚 Уникальных слов: {}\n\
     🎲 Викторин сыграно: {}\n\
     ✅ Правильных ответов: {}\n\
     📅 С нами с: {}",
    s.total_lookups,
    s.unique_words,
    s.quiz_games,
    s.quiz_correct,
    s.created_at.format("%Y-%m-%d")
  )))
}

fn admin_overview(state: &AppState) -> Result<Reply, String> {
  let t = state.store.try_totals().map_err(|e| e.to_string())?;
  Ok(Reply::text(format!(
    "🛠 Обзор хранилища:\n\nПользователей: {}\nСлов в словарях: {}\nВсего запросов: {}\nИИ-генерация: {}",
    t.users,
    t.entries,
    t.lookups,
    if state.source.has_generator() { "включена" } else { "выключена" }
  )))
}

#[instrument(level = "info", skip(state))]
pub async fn start_quiz(state: &AppState, user_id: i64) -> Reply {
  let q = state.quiz.start_quiz(user_id).await;
  Reply::text(format!("❓ Викторина!\n\n{}", q.question)).with_choices(q.options)
}

/// Grade the answer to the active quiz. `option` is 0-based.
#[instrument(level = "info", skip(state), fields(option))]
pub async fn answer_quiz(state: &AppState, user_id: i64, option: usize) -> Reply {
  let reply = match state.quiz.answer(user_id, option).await {
    None => Reply::text("❓ Сейчас нет активной викторины. Нажмите 🎲 Викторина, чтобы начать."),
    Some(v) if v.correct => Reply::text("✅ Правильно! Молодец! 🎉\n\nХочешь сыграть еще раз? Нажми 🎲 Викторина в меню!"),
    Some(v) => Reply::text(format!(
      "❌ Неправильно. Правильный ответ: вариант {}\n{}\n\nХочешь сыграть еще раз? Нажми 🎲 Викторина в меню!",
      v.correct_index + 1,
      v.correct_text
    )),
  };
  finish(state, reply)
}

/// Current conversation state, exposed for transports and tests.
pub async fn conversation_state(state: &AppState, user_id: i64) -> ConversationState {
  state.sessions.state(user_id).await
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn buttons_match_by_prefix() {
    assert_eq!(parse_command("1️⃣ Объяснить слово"), Some(Command::Await(Intent::Word)));
    assert_eq!(parse_command("4️⃣ Характеристика героя"), Some(Command::Await(Intent::Character)));
    assert_eq!(parse_command("🎲 Викторина"), Some(Command::Quiz));
  }

  #[test]
  fn slash_commands_match_first_token() {
    assert_eq!(parse_command("/слово"), Some(Command::Await(Intent::Word)));
    assert_eq!(parse_command("  /start@LitBot "), Some(Command::Start));
    assert_eq!(parse_command("/экспорт csv"), Some(Command::Export));
  }

  #[test]
  fn free_text_is_not_a_command() {
    assert_eq!(parse_command("облом"), None);
    assert_eq!(parse_command(""), None);
    assert_eq!(parse_command("/неизвестно"), None);
  }

  #[test]
  fn every_menu_label_is_recognized() {
    for label in main_menu() {
      assert!(parse_command(&label).is_some(), "{label}");
    }
  }
}
