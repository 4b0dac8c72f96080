//! Photo → emoji pack pipeline.
//!
//! `Received → Downloading → Tiling → Publishing → Reported`. Every failure is
//! reported to the sender with the same generic text; the per-message tile
//! workspace is removed on every exit path.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{SystemTime, UNIX_EPOCH},
};

use tracing::{debug, error, info, warn};

use crate::{
    audit::{AuditEvent, AuditSink},
    config::Config,
    domain::largest_photo,
    errors::Error,
    messaging::{port::MessagingPort, types::PhotoMessage},
    ports::{BotIdentity, PhotoSource, StickerSetPort},
    publisher::PackPublisher,
    replies,
    sticker::{pack_name, pack_stamp, PackDescriptor},
    tiler::{self, TileWorkspace},
    Result,
};

static PACK_SEQ: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Received,
    Downloading,
    Tiling,
    Publishing,
    Reported,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Downloading => "downloading",
            Stage::Tiling => "tiling",
            Stage::Publishing => "publishing",
            Stage::Reported => "reported",
        }
    }
}

/// What the sender was told.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Published { pack_name: String, url: String },
    Failed { stage: Stage, kind: &'static str },
}

/// Remote collaborators of the pipeline.
#[derive(Clone)]
pub struct Ports {
    pub photos: Arc<dyn PhotoSource>,
    pub identity: Arc<dyn BotIdentity>,
    pub stickers: Arc<dyn StickerSetPort>,
    pub messenger: Arc<dyn MessagingPort>,
}

pub struct PhotoPipeline {
    cfg: Arc<Config>,
    photos: Arc<dyn PhotoSource>,
    identity: Arc<dyn BotIdentity>,
    messenger: Arc<dyn MessagingPort>,
    publisher: PackPublisher,
    audit: Arc<dyn AuditSink>,
}

impl PhotoPipeline {
    pub fn new(cfg: Arc<Config>, ports: Ports, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            cfg,
            photos: ports.photos,
            identity: ports.identity,
            messenger: ports.messenger,
            publisher: PackPublisher::new(ports.stickers),
            audit,
        }
    }

    pub async fn handle_photo(&self, msg: &PhotoMessage) -> Outcome {
        let user_id = msg.user_id.map(|u| u.0);
        let chat_id = msg.chat_id.0;
        info!(
            user_id = ?user_id,
            username = ?msg.username,
            message_id = msg.message_id.0,
            "processing photo message"
        );
        self.enter(msg, Stage::Received);

        let mut stage = Stage::Received;
        let mut workspace: Option<TileWorkspace> = None;
        let result = self.run(msg, &mut stage, &mut workspace).await;

        let outcome = match result {
            Ok((pack_name, tiles)) => {
                let url = self.cfg.pack_url(&pack_name);
                info!(set_name = %pack_name, url = %url, "sticker set created successfully");
                self.audit
                    .record(AuditEvent::published(user_id, chat_id, &pack_name, tiles));
                self.reply(msg, &replies::success(&url)).await;
                Outcome::Published { pack_name, url }
            }
            Err(e) => {
                error!(
                    stage = stage.as_str(),
                    kind = e.kind(),
                    user_correctable = e.is_user_correctable(),
                    error = %e,
                    "error processing photo message"
                );
                self.audit
                    .record(AuditEvent::failed(user_id, chat_id, stage.as_str(), &e));
                self.reply(msg, replies::FAILURE).await;
                Outcome::Failed {
                    stage,
                    kind: e.kind(),
                }
            }
        };
        self.enter(msg, Stage::Reported);

        if let Some(ws) = workspace.take() {
            if let Err(e) = ws.close() {
                warn!(error = %e, "error cleaning up temporary files");
            }
        }

        outcome
    }

    async fn run(
        &self,
        msg: &PhotoMessage,
        stage: &mut Stage,
        workspace: &mut Option<TileWorkspace>,
    ) -> Result<(String, usize)> {
        *stage = Stage::Downloading;
        self.enter(msg, *stage);
        let best = largest_photo(&msg.sizes)
            .ok_or_else(|| Error::Download("message carries no photo".to_string()))?;
        debug!(
            file_id = %best.file_id.0,
            width = best.width,
            height = best.height,
            "downloading image"
        );
        let bytes = self.photos.fetch_photo(&best.file_id).await?;
        debug!(bytes = bytes.len(), "image downloaded successfully");

        *stage = Stage::Tiling;
        self.enter(msg, *stage);
        let dir = workspace
            .insert(TileWorkspace::create_in(&self.cfg.temp_dir)?)
            .path()
            .to_path_buf();
        let spec = self.cfg.tile_spec();
        let tiles = tokio::task::spawn_blocking(move || tiler::process_image(&bytes, spec, &dir))
            .await
            .map_err(|e| Error::External(format!("tiling task failed: {e}")))??;
        self.audit.record(AuditEvent::tiled(
            msg.user_id.map(|u| u.0),
            msg.chat_id.0,
            tiles.len(),
        ));

        *stage = Stage::Publishing;
        self.enter(msg, *stage);
        let owner = msg
            .user_id
            .ok_or_else(|| Error::Identity("could not determine user id".to_string()))?;
        let bot_username = self
            .identity
            .bot_username()
            .await
            .map_err(|e| Error::Identity(format!("could not look up bot: {e}")))?
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| Error::Identity("could not determine bot username".to_string()))?;

        let descriptor = PackDescriptor {
            owner,
            pack_name: pack_name(&next_stamp(), &bot_username)?,
            title: self.cfg.pack_title.clone(),
            emoji: self.cfg.pack_emoji.clone(),
        };
        info!(
            user_id = owner.0,
            set_name = %descriptor.pack_name,
            title = %descriptor.title,
            "creating sticker set"
        );
        self.reply(msg, replies::IN_PROGRESS).await;

        let name = self
            .publisher
            .create_sticker_set(&descriptor, &tiles)
            .await?;
        Ok((name, tiles.len()))
    }

    fn enter(&self, msg: &PhotoMessage, stage: Stage) {
        self.audit.record(AuditEvent::stage(
            msg.user_id.map(|u| u.0),
            msg.chat_id.0,
            stage.as_str(),
        ));
    }

    async fn reply(&self, msg: &PhotoMessage, text: &str) {
        if let Err(e) = self.messenger.send_text(msg.chat_id, text).await {
            warn!(chat_id = msg.chat_id.0, error = %e, "failed to send reply");
        }
    }
}

fn next_stamp() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    pack_stamp(nanos, PACK_SEQ.fetch_add(1, Ordering::SeqCst))
}
