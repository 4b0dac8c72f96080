use teloxide::types::{BotCommand, Message};

use tilemoji_core::{domain::ChatId, messaging::types::Command};

use super::sender;

/// Commands shown in the Telegram UI.
pub fn bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "how to turn a photo into an emoji pack"),
        BotCommand::new("help", "show the instructions again"),
    ]
}

pub fn command(msg: &Message, text: &str) -> Option<Command> {
    if !text.starts_with('/') {
        return None;
    }
    let (name, args) = parse_command(text);
    Some(Command {
        chat_id: ChatId(msg.chat.id.0),
        user_id: sender(msg),
        name,
        args,
    })
}

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}
