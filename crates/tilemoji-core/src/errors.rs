/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the pipeline can
/// handle failures consistently: every variant ends up as the same generic
/// reply, but `kind()` keeps them apart in logs and the audit trail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("could not determine image dimensions: {0}")]
    Dimensions(String),

    #[error("image too small for tiles ({tiles_x}x{tiles_y} grid)")]
    TooSmall { tiles_x: u32, tiles_y: u32 },

    #[error("image too large: {tiles} tiles exceeds the maximum of {max}")]
    TooLarge { tiles: u64, max: u32 },

    #[error("identity error: {0}")]
    Identity(String),

    #[error("failed to create sticker set: {0}")]
    Publish(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// Stable label for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::Download(_) => "download",
            Error::Dimensions(_) => "dimensions",
            Error::TooSmall { .. } => "too_small",
            Error::TooLarge { .. } => "too_large",
            Error::Identity(_) => "identity",
            Error::Publish(_) => "publish",
            Error::Io(_) => "io",
            Error::Image(_) => "image",
            Error::Json(_) => "json",
            Error::External(_) => "external",
        }
    }

    /// Whether the sender can fix this by sending a different picture.
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Error::TooSmall { .. } | Error::TooLarge { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
