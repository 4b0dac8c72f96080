use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, tiler::TileSpec, Result};

pub const DEFAULT_TILE_SIZE: u32 = 100;
pub const DEFAULT_MAX_TILES: u32 = 120;
pub const DEFAULT_PACK_TITLE: &str = "Static Emoji Pack";
pub const DEFAULT_PACK_EMOJI: &str = "🧩";
pub const DEFAULT_LINK_HOST: &str = "t.me";

/// Typed configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    /// Empty means everyone may use the bot.
    pub telegram_allowed_users: Vec<u64>,

    // Tiling
    pub tile_size: u32,
    pub max_tiles: u32,

    // Pack
    pub pack_title: String,
    pub pack_emoji: String,
    pub sticker_link_host: String,

    // Scratch space for per-message workspaces
    pub temp_dir: PathBuf,

    // Audit
    pub audit_log_path: Option<PathBuf>,
    pub audit_log_json: bool,
}

impl Config {
    /// Load from the process environment, reading `.env` first if present.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `load()` passes the real environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        // Required env vars
        let telegram_bot_token = get("BOT_TOKEN")
            .or_else(|| get("TELEGRAM_BOT_TOKEN"))
            .ok_or_else(|| {
                Error::Config("BOT_TOKEN environment variable is required".to_string())
            })?;

        let telegram_allowed_users =
            parse_csv_u64("TELEGRAM_ALLOWED_USERS", get("TELEGRAM_ALLOWED_USERS"))?;

        let tile_size = parse_positive("TILE_SIZE", get("TILE_SIZE"), DEFAULT_TILE_SIZE)?;
        let max_tiles = parse_positive("MAX_TILES", get("MAX_TILES"), DEFAULT_MAX_TILES)?;

        let pack_title = get("PACK_TITLE").unwrap_or_else(|| DEFAULT_PACK_TITLE.to_string());
        let pack_emoji = get("PACK_EMOJI").unwrap_or_else(|| DEFAULT_PACK_EMOJI.to_string());
        let sticker_link_host =
            get("STICKER_LINK_HOST").unwrap_or_else(|| DEFAULT_LINK_HOST.to_string());

        let temp_dir = get("TEMP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir);

        let audit_log_path = get("AUDIT_LOG_PATH").map(PathBuf::from);
        let audit_log_json = get("AUDIT_LOG_JSON")
            .map(|s| parse_bool(&s))
            .unwrap_or(false);

        Ok(Self {
            telegram_bot_token,
            telegram_allowed_users,
            tile_size,
            max_tiles,
            pack_title,
            pack_emoji,
            sticker_link_host,
            temp_dir,
            audit_log_path,
            audit_log_json,
        })
    }

    pub fn tile_spec(&self) -> TileSpec {
        TileSpec {
            tile_size: self.tile_size,
            max_tiles: self.max_tiles,
        }
    }

    pub fn pack_url(&self, pack_name: &str) -> String {
        format!("https://{}/addstickers/{pack_name}", self.sticker_link_host)
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, unquote(v.trim()));
    }
}

fn unquote(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return &val[1..val.len() - 1];
    }
    val
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_positive(key: &str, raw: Option<String>, default: u32) -> Result<u32> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<u32>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(Error::Config(format!(
            "{key} must be a positive integer, got {raw:?}"
        ))),
    }
}

/// Blank entries are skipped; every other entry must be a numeric user id.
fn parse_csv_u64(key: &str, v: Option<String>) -> Result<Vec<u64>> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>().map_err(|_| {
                Error::Config(format!("{key} must list numeric user ids, got {s:?}"))
            })
        })
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
