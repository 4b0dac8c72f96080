//! Telegram update handlers.
//!
//! Each handler converts the teloxide message into the core update model and
//! hands it to `tilemoji_core::app::App`.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use tilemoji_core::{
    domain::{ChatId, UserId},
    messaging::types::{IncomingUpdate, OtherMessage},
};

use crate::router::AppState;

pub mod commands;
pub mod photo;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let update = to_update(&msg);
    let _ = state.app.handle_update(update).await;
    Ok(())
}

/// Classify a Telegram message.
pub fn to_update(msg: &Message) -> IncomingUpdate {
    if let Some(photo) = photo::photo_message(msg) {
        return IncomingUpdate::Photo(photo);
    }

    if let Some(cmd) = msg.text().and_then(|text| commands::command(msg, text)) {
        return IncomingUpdate::Command(cmd);
    }

    IncomingUpdate::Other(OtherMessage {
        chat_id: ChatId(msg.chat.id.0),
        user_id: sender(msg),
    })
}

pub(crate) fn sender(msg: &Message) -> Option<UserId> {
    msg.from.as_ref().map(|u| UserId(u.id.0))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a message from Bot API JSON.
    pub(crate) fn message(extra: serde_json::Value) -> Message {
        let mut base = serde_json::json!({
            "message_id": 7,
            "date": 1_700_000_000,
            "chat": { "id": 10, "type": "private", "first_name": "Alice" },
            "from": { "id": 42, "is_bot": false, "first_name": "Alice", "username": "alice" },
        });
        if let (Some(obj), Some(more)) = (base.as_object_mut(), extra.as_object()) {
            for (k, v) in more {
                obj.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn plain_text_is_other() {
        let msg = message(serde_json::json!({ "text": "hello" }));
        let IncomingUpdate::Other(other) = to_update(&msg) else {
            panic!("expected other");
        };
        assert_eq!(other.chat_id, ChatId(10));
        assert_eq!(other.user_id, Some(UserId(42)));
    }

    #[test]
    fn slash_text_is_command() {
        let msg = message(serde_json::json!({ "text": "/help@TilesBot now" }));
        let IncomingUpdate::Command(cmd) = to_update(&msg) else {
            panic!("expected command");
        };
        assert_eq!(cmd.name, "help");
        assert_eq!(cmd.args, "now");
    }

    #[test]
    fn photo_wins_over_caption() {
        let msg = message(serde_json::json!({
            "caption": "/start",
            "photo": [
                { "file_id": "a", "file_unique_id": "ua", "width": 90, "height": 60, "file_size": 10 }
            ]
        }));
        assert!(matches!(to_update(&msg), IncomingUpdate::Photo(_)));
    }
}
