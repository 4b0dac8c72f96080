//! Hexagonal ports for the Telegram side of the pipeline.
//!
//! The teloxide adapter implements these; tests use in-memory fakes.

use async_trait::async_trait;

use crate::{
    domain::{FileId, UserId},
    sticker::{InputTile, StickerKind},
    Result,
};

/// Fetches the bytes behind a file reference.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Fails with `Error::Download` unless the transfer completes with a
    /// success status.
    async fn fetch_photo(&self, file_id: &FileId) -> Result<Vec<u8>>;
}

/// The running bot's own identity.
#[async_trait]
pub trait BotIdentity: Send + Sync {
    async fn bot_username(&self) -> Result<Option<String>>;
}

/// Sticker set management.
///
/// Neither call reports partial success: each either fully applies or errors.
#[async_trait]
pub trait StickerSetPort: Send + Sync {
    async fn create_new_sticker_set(
        &self,
        owner: UserId,
        name: &str,
        title: &str,
        kind: StickerKind,
        first: InputTile,
    ) -> Result<()>;

    async fn add_sticker_to_set(&self, owner: UserId, name: &str, sticker: InputTile)
        -> Result<()>;
}
