use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    audit::{AuditEvent, AuditSink},
    config::Config,
    domain::ChatId,
    messaging::{
        port::MessagingPort,
        types::{Command, IncomingUpdate},
    },
    pipeline::{Outcome, PhotoPipeline, Ports},
    replies,
    security::is_authorized,
};

/// Routes incoming updates: photos go through the pipeline, everything else
/// gets the welcome text.
pub struct App {
    cfg: Arc<Config>,
    messenger: Arc<dyn MessagingPort>,
    audit: Arc<dyn AuditSink>,
    pipeline: PhotoPipeline,
}

impl App {
    pub fn new(cfg: Arc<Config>, ports: Ports, audit: Arc<dyn AuditSink>) -> Self {
        let messenger = ports.messenger.clone();
        let pipeline = PhotoPipeline::new(cfg.clone(), ports, audit.clone());
        Self {
            cfg,
            messenger,
            audit,
            pipeline,
        }
    }

    /// Returns the pipeline outcome for photos, `None` for everything else.
    pub async fn handle_update(&self, update: IncomingUpdate) -> Option<Outcome> {
        let chat_id = update.chat_id();
        let user_id = update.user_id();

        if !is_authorized(user_id, &self.cfg.telegram_allowed_users) {
            self.audit
                .record(AuditEvent::auth(user_id.map(|u| u.0), chat_id.0, false));
            self.send(chat_id, replies::UNAUTHORIZED).await;
            return None;
        }

        match update {
            IncomingUpdate::Photo(photo) => Some(self.pipeline.handle_photo(&photo).await),
            IncomingUpdate::Command(cmd) => {
                self.handle_command(&cmd).await;
                None
            }
            IncomingUpdate::Other(_) => {
                self.send(chat_id, &replies::welcome(self.cfg.tile_spec()))
                    .await;
                None
            }
        }
    }

    async fn handle_command(&self, cmd: &Command) {
        match cmd.name.as_str() {
            "start" | "help" => {}
            other => info!(command = other, args = %cmd.args, "unknown command"),
        }
        self.send(cmd.chat_id, &replies::welcome(self.cfg.tile_spec()))
            .await;
    }

    async fn send(&self, chat_id: ChatId, text: &str) {
        if let Err(e) = self.messenger.send_text(chat_id, text).await {
            warn!(chat_id = chat_id.0, error = %e, "failed to send reply");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{
        domain::UserId,
        messaging::types::OtherMessage,
        pipeline::tests::{
            photo_message, test_config, FakeIdentity, FakeMessenger, FakePhotos, Recorder,
        },
        publisher::tests::FakeStickers,
        tiler::tests::png_bytes,
    };

    struct Fixture {
        _scratch: tempfile::TempDir,
        cfg: Arc<Config>,
        messenger: Arc<FakeMessenger>,
        stickers: Arc<FakeStickers>,
        audit: Arc<Recorder>,
        app: App,
    }

    fn fixture(allowed: &str) -> Fixture {
        let scratch = tempfile::tempdir().unwrap();
        let mut cfg = (*test_config(scratch.path())).clone();
        if !allowed.is_empty() {
            let vars = HashMap::from([
                ("BOT_TOKEN", "t".to_string()),
                ("TELEGRAM_ALLOWED_USERS", allowed.to_string()),
            ]);
            cfg.telegram_allowed_users = Config::from_lookup(|k| vars.get(k).cloned())
                .unwrap()
                .telegram_allowed_users;
        }

        let messenger = Arc::new(FakeMessenger::default());
        let stickers = Arc::new(FakeStickers::default());
        let audit = Arc::new(Recorder::default());
        let cfg = Arc::new(cfg);
        let app = App::new(
            cfg.clone(),
            Ports {
                photos: Arc::new(FakePhotos(Some(png_bytes(200, 100)))),
                identity: Arc::new(FakeIdentity(Some("bot".to_string()))),
                stickers: stickers.clone(),
                messenger: messenger.clone(),
            },
            audit.clone(),
        );
        Fixture {
            _scratch: scratch,
            cfg,
            messenger,
            stickers,
            audit,
            app,
        }
    }

    #[tokio::test]
    async fn start_command_gets_welcome() {
        let f = fixture("");
        let out = f
            .app
            .handle_update(IncomingUpdate::Command(Command {
                chat_id: ChatId(1),
                user_id: Some(UserId(1)),
                name: "start".to_string(),
                args: String::new(),
            }))
            .await;
        assert!(out.is_none());
        let sent = f.messenger.sent.lock().unwrap().clone();
        assert_eq!(sent, vec![replies::welcome(f.cfg.tile_spec())]);
    }

    #[tokio::test]
    async fn non_photo_message_gets_welcome() {
        let f = fixture("");
        f.app
            .handle_update(IncomingUpdate::Other(OtherMessage {
                chat_id: ChatId(1),
                user_id: Some(UserId(1)),
            }))
            .await;
        assert_eq!(f.messenger.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn photo_goes_through_the_pipeline() {
        let f = fixture("");
        let out = f
            .app
            .handle_update(IncomingUpdate::Photo(photo_message(Some(42))))
            .await;
        assert!(matches!(out, Some(Outcome::Published { .. })));
        assert_eq!(f.stickers.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn strangers_are_turned_away() {
        let f = fixture("1,2");
        let out = f
            .app
            .handle_update(IncomingUpdate::Photo(photo_message(Some(42))))
            .await;
        assert!(out.is_none());
        assert!(f.stickers.calls.lock().unwrap().is_empty());
        assert_eq!(
            f.messenger.sent.lock().unwrap().clone(),
            vec![replies::UNAUTHORIZED.to_string()]
        );
        assert_eq!(f.audit.0.lock().unwrap()[0].authorized, Some(false));
    }
}
