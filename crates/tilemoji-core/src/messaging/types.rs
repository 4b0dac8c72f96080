use crate::domain::{ChatId, MessageId, PhotoSize, UserId};

/// Messenger-agnostic incoming update model.
///
/// Telegram-specific fields live in the Telegram adapter.
#[derive(Clone, Debug)]
pub enum IncomingUpdate {
    Command(Command),
    Photo(PhotoMessage),
    Other(OtherMessage),
}

#[derive(Clone, Debug)]
pub struct Command {
    pub chat_id: ChatId,
    pub user_id: Option<UserId>,
    pub name: String,
    pub args: String,
}

#[derive(Clone, Debug)]
pub struct PhotoMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    /// Missing for channel posts and anonymous admins.
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    /// All resolution variants Telegram offered.
    pub sizes: Vec<PhotoSize>,
}

#[derive(Clone, Debug)]
pub struct OtherMessage {
    pub chat_id: ChatId,
    pub user_id: Option<UserId>,
}

impl IncomingUpdate {
    pub fn chat_id(&self) -> ChatId {
        match self {
            IncomingUpdate::Command(c) => c.chat_id,
            IncomingUpdate::Photo(p) => p.chat_id,
            IncomingUpdate::Other(o) => o.chat_id,
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            IncomingUpdate::Command(c) => c.user_id,
            IncomingUpdate::Photo(p) => p.user_id,
            IncomingUpdate::Other(o) => o.user_id,
        }
    }
}
