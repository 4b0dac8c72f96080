//! Pack publishing: create with the first tile, then append the rest in order.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::{
    errors::Error,
    ports::StickerSetPort,
    sticker::{InputTile, PackDescriptor, StickerKind},
    tiler::TileArtifact,
    Result,
};

pub struct PackPublisher {
    stickers: Arc<dyn StickerSetPort>,
}

impl PackPublisher {
    pub fn new(stickers: Arc<dyn StickerSetPort>) -> Self {
        Self { stickers }
    }

    /// Publish `tiles` as a new custom emoji pack and return its name.
    ///
    /// Calls are issued one at a time in input order; the first failure stops
    /// the sequence. A partially built pack is left as is on Telegram.
    pub async fn create_sticker_set(
        &self,
        descriptor: &PackDescriptor,
        tiles: &[TileArtifact],
    ) -> Result<String> {
        info!(
            user_id = descriptor.owner.0,
            set_name = %descriptor.pack_name,
            total_stickers = tiles.len(),
            "creating sticker set"
        );

        self.publish(descriptor, tiles).await.map_err(|e| {
            error!(error = %e, kind = e.kind(), "error creating sticker set");
            match e {
                Error::Publish(_) => e,
                other => Error::Publish(other.to_string()),
            }
        })?;

        info!(set_name = %descriptor.pack_name, "sticker set creation completed");
        Ok(descriptor.pack_name.clone())
    }

    async fn publish(&self, descriptor: &PackDescriptor, tiles: &[TileArtifact]) -> Result<()> {
        let Some((first, rest)) = tiles.split_first() else {
            return Err(Error::Publish("no tiles to publish".to_string()));
        };

        debug!("creating initial sticker set");
        self.stickers
            .create_new_sticker_set(
                descriptor.owner,
                &descriptor.pack_name,
                &descriptor.title,
                StickerKind::CustomEmoji,
                InputTile::static_tile(&first.path, &descriptor.emoji)?,
            )
            .await?;
        info!("initial sticker set created");

        debug!(remaining = rest.len(), "adding remaining stickers");
        for (i, tile) in rest.iter().enumerate() {
            self.stickers
                .add_sticker_to_set(
                    descriptor.owner,
                    &descriptor.pack_name,
                    InputTile::static_tile(&tile.path, &descriptor.emoji)?,
                )
                .await?;
            debug!(index = i + 1, "added sticker");
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        path::{Path, PathBuf},
        sync::Mutex,
    };

    use async_trait::async_trait;

    use super::*;
    use crate::{domain::UserId, sticker::StickerFormat};

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub(crate) enum Call {
        Create {
            name: String,
            title: String,
            kind: StickerKind,
            file: PathBuf,
        },
        Add {
            name: String,
            file: PathBuf,
        },
    }

    /// Records every call; fails the call with index `fail_at` (0-based).
    #[derive(Default)]
    pub(crate) struct FakeStickers {
        pub(crate) calls: Mutex<Vec<Call>>,
        pub(crate) fail_at: Option<usize>,
    }

    impl FakeStickers {
        pub(crate) fn failing_at(idx: usize) -> Self {
            Self {
                fail_at: Some(idx),
                ..Default::default()
            }
        }

        fn push(&self, call: Call) -> Result<()> {
            let mut calls = self.calls.lock().unwrap();
            let idx = calls.len();
            calls.push(call);
            if self.fail_at == Some(idx) {
                return Err(Error::External("telegram error: STICKERSET_INVALID".into()));
            }
            Ok(())
        }
    }

    fn check(sticker: &InputTile) {
        assert_eq!(sticker.format(), StickerFormat::Static);
        assert_eq!(sticker.emoji_list(), ["🧩".to_string()]);
    }

    #[async_trait]
    impl StickerSetPort for FakeStickers {
        async fn create_new_sticker_set(
            &self,
            _owner: UserId,
            name: &str,
            title: &str,
            kind: StickerKind,
            first: InputTile,
        ) -> Result<()> {
            check(&first);
            self.push(Call::Create {
                name: name.to_string(),
                title: title.to_string(),
                kind,
                file: first.file().to_path_buf(),
            })
        }

        async fn add_sticker_to_set(
            &self,
            _owner: UserId,
            name: &str,
            sticker: InputTile,
        ) -> Result<()> {
            check(&sticker);
            self.push(Call::Add {
                name: name.to_string(),
                file: sticker.file().to_path_buf(),
            })
        }
    }

    fn descriptor() -> PackDescriptor {
        PackDescriptor {
            owner: UserId(42),
            pack_name: "pack_abc_by_bot".to_string(),
            title: "Static Emoji Pack".to_string(),
            emoji: "🧩".to_string(),
        }
    }

    fn tiles(n: u32) -> Vec<TileArtifact> {
        (0..n)
            .map(|x| TileArtifact {
                x,
                y: 0,
                path: Path::new("/scratch").join(format!("tile_{x}_0.png")),
            })
            .collect()
    }

    #[tokio::test]
    async fn creates_then_appends_in_order() {
        let fake = Arc::new(FakeStickers::default());
        let publisher = PackPublisher::new(fake.clone());

        let name = publisher
            .create_sticker_set(&descriptor(), &tiles(4))
            .await
            .unwrap();
        assert_eq!(name, "pack_abc_by_bot");

        let calls = fake.calls.lock().unwrap();
        assert_eq!(calls.len(), 4);
        assert_eq!(
            calls[0],
            Call::Create {
                name: "pack_abc_by_bot".into(),
                title: "Static Emoji Pack".into(),
                kind: StickerKind::CustomEmoji,
                file: "/scratch/tile_0_0.png".into(),
            }
        );
        for (i, call) in calls.iter().enumerate().skip(1) {
            assert_eq!(
                call,
                &Call::Add {
                    name: "pack_abc_by_bot".into(),
                    file: format!("/scratch/tile_{i}_0.png").into(),
                }
            );
        }
    }

    #[tokio::test]
    async fn single_tile_needs_no_appends() {
        let fake = Arc::new(FakeStickers::default());
        let publisher = PackPublisher::new(fake.clone());
        publisher
            .create_sticker_set(&descriptor(), &tiles(1))
            .await
            .unwrap();
        assert_eq!(fake.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stops_at_first_failed_append() {
        let fake = Arc::new(FakeStickers::failing_at(2));
        let publisher = PackPublisher::new(fake.clone());

        let err = publisher
            .create_sticker_set(&descriptor(), &tiles(5))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "publish");
        assert_eq!(fake.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn failed_create_issues_no_appends() {
        let fake = Arc::new(FakeStickers::failing_at(0));
        let publisher = PackPublisher::new(fake.clone());

        let err = publisher
            .create_sticker_set(&descriptor(), &tiles(3))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Publish(_)));
        assert_eq!(fake.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_input_is_rejected_without_calls() {
        let fake = Arc::new(FakeStickers::default());
        let publisher = PackPublisher::new(fake.clone());
        let err = publisher
            .create_sticker_set(&descriptor(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Publish(_)));
        assert!(fake.calls.lock().unwrap().is_empty());
    }
}
