//! Telegram adapter (teloxide).
//!
//! This crate implements the `tilemoji-core` ports over the Telegram Bot API.

use async_trait::async_trait;

use teloxide::{
    net::Download,
    prelude::*,
    types::{
        FileId as TgFileId, InputFile, InputSticker, StickerFormat as TgStickerFormat,
        StickerType,
    },
};

use tracing::debug;

pub mod handlers;
pub mod router;

use tilemoji_core::{
    domain::{ChatId, FileId, MessageId, MessageRef, UserId},
    errors::Error,
    messaging::port::MessagingPort,
    ports::{BotIdentity, PhotoSource, StickerSetPort},
    sticker::{InputTile, StickerFormat, StickerKind},
    Result,
};

#[derive(Clone)]
pub struct TelegramAdapter {
    bot: Bot,
}

impl TelegramAdapter {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_user(user_id: UserId) -> teloxide::types::UserId {
        teloxide::types::UserId(user_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    fn tg_sticker(tile: InputTile) -> InputSticker {
        let format = match tile.format() {
            StickerFormat::Static => TgStickerFormat::Static,
        };
        InputSticker {
            sticker: InputFile::file(tile.file().to_path_buf()),
            format,
            emoji_list: tile.emoji_list().to_vec(),
            mask_position: None,
            keywords: vec![],
        }
    }
}

#[async_trait]
impl PhotoSource for TelegramAdapter {
    async fn fetch_photo(&self, file_id: &FileId) -> Result<Vec<u8>> {
        let file = self
            .bot
            .get_file(TgFileId(file_id.0.clone()))
            .await
            .map_err(|e| Error::Download(format!("could not resolve file: {e}")))?;
        debug!(path = %file.path, size = file.size, "resolved telegram file");

        let mut data = Vec::with_capacity(file.size as usize);
        self.bot
            .download_file(&file.path, &mut data)
            .await
            .map_err(|e| Error::Download(e.to_string()))?;
        Ok(data)
    }
}

#[async_trait]
impl BotIdentity for TelegramAdapter {
    async fn bot_username(&self) -> Result<Option<String>> {
        let me = self.bot.get_me().await.map_err(Self::map_err)?;
        Ok(me.user.username.clone())
    }
}

#[async_trait]
impl StickerSetPort for TelegramAdapter {
    async fn create_new_sticker_set(
        &self,
        owner: UserId,
        name: &str,
        title: &str,
        kind: StickerKind,
        first: InputTile,
    ) -> Result<()> {
        let sticker_type = match kind {
            StickerKind::CustomEmoji => StickerType::CustomEmoji,
        };
        self.bot
            .create_new_sticker_set(
                Self::tg_user(owner),
                name.to_string(),
                title.to_string(),
                vec![Self::tg_sticker(first)],
            )
            .sticker_type(sticker_type)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn add_sticker_to_set(
        &self,
        owner: UserId,
        name: &str,
        sticker: InputTile,
    ) -> Result<()> {
        self.bot
            .add_sticker_to_set(
                Self::tg_user(owner),
                name.to_string(),
                Self::tg_sticker(sticker),
            )
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }
}

#[async_trait]
impl MessagingPort for TelegramAdapter {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let msg = self
            .bot
            .send_message(Self::tg_chat(chat_id), text.to_string())
            .await
            .map_err(Self::map_err)?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }
}
