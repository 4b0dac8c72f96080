//! Fixed user-facing texts.

use crate::tiler::TileSpec;

pub const IN_PROGRESS: &str = "Creating your emoji pack... This may take a moment.";

pub const FAILURE: &str = "Sorry, there was an error processing your photo. \
Please try again with a different image format (PNG, JPEG, or WebP).";

pub const UNAUTHORIZED: &str = "Unauthorized. Contact the bot owner for access.";

pub fn welcome(spec: TileSpec) -> String {
    let size = spec.tile_size;
    format!(
        "Hi! Send me a photo and I'll slice it into a custom emoji pack.\n\n\
Every {size}x{size} block of the picture becomes one emoji, left to right, top to bottom. \
The picture needs at least one full block and at most {} blocks.",
        spec.max_tiles
    )
}

pub fn success(pack_url: &str) -> String {
    format!("Your emoji pack has been created! You can find it here: {pack_url}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_mentions_limits() {
        let text = welcome(TileSpec {
            tile_size: 100,
            max_tiles: 120,
        });
        assert!(text.contains("100x100"));
        assert!(text.contains("120 blocks"));
    }

    #[test]
    fn success_includes_url() {
        let url = "https://t.me/addstickers/pack_a_by_bot";
        assert!(success(url).ends_with(url));
    }
}
