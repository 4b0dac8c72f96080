use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;

use crate::{domain::UserId, errors::Error, Result};

/// Telegram allows up to 20 emoji per sticker.
const MAX_EMOJI_PER_STICKER: usize = 20;
const MAX_PACK_NAME_LEN: usize = 64;

static PACK_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("pack name regex"));

/// Sticker file format tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StickerFormat {
    Static,
}

/// Kind of sticker set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StickerKind {
    CustomEmoji,
}

/// One sticker to upload.
///
/// Fields are private so a payload can only exist in a valid shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputTile {
    file: PathBuf,
    format: StickerFormat,
    emoji_list: Vec<String>,
}

impl InputTile {
    pub fn new(
        file: impl Into<PathBuf>,
        format: StickerFormat,
        emoji_list: Vec<String>,
    ) -> Result<Self> {
        if emoji_list.is_empty() || emoji_list.len() > MAX_EMOJI_PER_STICKER {
            return Err(Error::Publish(format!(
                "a sticker needs 1..={MAX_EMOJI_PER_STICKER} emoji, got {}",
                emoji_list.len()
            )));
        }
        if emoji_list.iter().any(|e| e.trim().is_empty()) {
            return Err(Error::Publish("blank emoji label".to_string()));
        }
        Ok(Self {
            file: file.into(),
            format,
            emoji_list,
        })
    }

    /// Static tile labelled with a single emoji.
    pub fn static_tile(file: impl Into<PathBuf>, emoji: &str) -> Result<Self> {
        Self::new(file, StickerFormat::Static, vec![emoji.to_string()])
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn format(&self) -> StickerFormat {
        self.format
    }

    pub fn emoji_list(&self) -> &[String] {
        &self.emoji_list
    }
}

/// Metadata for a pack about to be created. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackDescriptor {
    pub owner: UserId,
    pub pack_name: String,
    pub title: String,
    pub emoji: String,
}

/// Derive a pack name: `pack_<stamp>_by_<bot>`.
///
/// `stamp` should be unique per call (see `pack_stamp`).
pub fn pack_name(stamp: &str, bot_username: &str) -> Result<String> {
    let name = format!("pack_{stamp}_by_{bot_username}");
    validate_pack_name(&name, bot_username)?;
    Ok(name)
}

/// Telegram rules: starts with a letter, ASCII letters/digits/underscores, no
/// double underscores, ends in `_by_<bot username>`, at most 64 chars.
pub fn validate_pack_name(name: &str, bot_username: &str) -> Result<()> {
    let ok = name.len() <= MAX_PACK_NAME_LEN
        && PACK_NAME_RE.is_match(name)
        && !name.contains("__")
        && name
            .to_lowercase()
            .ends_with(&format!("_by_{}", bot_username.to_lowercase()));

    if !ok {
        return Err(Error::Identity(format!(
            "cannot derive a valid pack name for bot {bot_username:?}: {name:?}"
        )));
    }
    Ok(())
}

/// Base-36 timestamp (nanoseconds) with a sequence suffix, so two packs made in
/// the same instant by this process still differ.
pub fn pack_stamp(nanos: u128, seq: u64) -> String {
    format!("{}_{}", to_base36(nanos), to_base36(u128::from(seq)))
}

fn to_base36(mut n: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
