use teloxide::types::Message;

use tilemoji_core::{
    domain::{ChatId, FileId, MessageId, PhotoSize},
    messaging::types::PhotoMessage,
};

use super::sender;

/// Extract the photo variants of a message, if it carries a photo.
pub fn photo_message(msg: &Message) -> Option<PhotoMessage> {
    let photos = msg.photo()?;
    let sizes = photos
        .iter()
        .map(|p| PhotoSize {
            file_id: FileId(p.file.id.0.clone()),
            width: p.width,
            height: p.height,
        })
        .collect();

    Some(PhotoMessage {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
        user_id: sender(msg),
        username: msg.from.as_ref().and_then(|u| u.username.clone()),
        sizes,
    })
}

#[cfg(test)]
mod tests {
    use tilemoji_core::domain::{largest_photo, UserId};

    use super::*;
    use crate::handlers::tests::message;

    #[test]
    fn keeps_every_variant() {
        let msg = message(serde_json::json!({
            "photo": [
                { "file_id": "small", "file_unique_id": "u1", "width": 90, "height": 60 },
                { "file_id": "big", "file_unique_id": "u2", "width": 1280, "height": 853 }
            ]
        }));
        let photo = photo_message(&msg).unwrap();
        assert_eq!(photo.sizes.len(), 2);
        assert_eq!(photo.user_id, Some(UserId(42)));
        assert_eq!(photo.username.as_deref(), Some("alice"));
        assert_eq!(photo.message_id, MessageId(7));
        assert_eq!(largest_photo(&photo.sizes).unwrap().file_id.0, "big");
    }

    #[test]
    fn text_is_not_a_photo() {
        let msg = message(serde_json::json!({ "text": "hi" }));
        assert!(photo_message(&msg).is_none());
    }
}
