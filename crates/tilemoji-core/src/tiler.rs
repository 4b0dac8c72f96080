//! Image tiling: slice a picture into a grid of square PNG tiles.
//!
//! Tiles are emitted in row-major order (`y` outer, `x` inner). Publishing
//! relies on that order, since append order decides the final pack layout.

use std::{
    fs::{self, File},
    io::{BufWriter, Cursor},
    path::{Path, PathBuf},
};

use image::{
    codecs::png::{CompressionType, FilterType, PngEncoder},
    imageops, ExtendedColorType, ImageEncoder, ImageReader, RgbaImage,
};
use tempfile::TempDir;
use tracing::{debug, error, info};

use crate::{errors::Error, Result};

const WORKSPACE_PREFIX: &str = "tilemoji-";

/// Tile edge length and grid cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileSpec {
    pub tile_size: u32,
    pub max_tiles: u32,
}

/// `tiles_x` columns by `tiles_y` rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileGrid {
    pub tiles_x: u32,
    pub tiles_y: u32,
}

impl TileGrid {
    pub fn len(&self) -> u64 {
        u64::from(self.tiles_x) * u64::from(self.tiles_y)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell coordinates in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> {
        let (tiles_x, tiles_y) = (self.tiles_x, self.tiles_y);
        (0..tiles_y).flat_map(move |y| (0..tiles_x).map(move |x| (x, y)))
    }
}

impl TileSpec {
    /// Compute and validate the grid for a `width` x `height` picture.
    ///
    /// Counts truncate: pixels past the last full tile are dropped.
    pub fn grid(&self, width: u32, height: u32) -> Result<TileGrid> {
        let grid = TileGrid {
            tiles_x: width / self.tile_size,
            tiles_y: height / self.tile_size,
        };

        if grid.is_empty() {
            error!(
                tiles_x = grid.tiles_x,
                tiles_y = grid.tiles_y,
                "image too small for tiles"
            );
            return Err(Error::TooSmall {
                tiles_x: grid.tiles_x,
                tiles_y: grid.tiles_y,
            });
        }

        if grid.len() > u64::from(self.max_tiles) {
            error!(
                total_tiles = grid.len(),
                max_tiles = self.max_tiles,
                "image too large for tiles"
            );
            return Err(Error::TooLarge {
                tiles: grid.len(),
                max: self.max_tiles,
            });
        }

        Ok(grid)
    }
}

/// One encoded tile on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileArtifact {
    pub x: u32,
    pub y: u32,
    pub path: PathBuf,
}

/// Per-message scratch directory. Removed on `close()` or drop.
#[derive(Debug)]
pub struct TileWorkspace {
    dir: TempDir,
}

impl TileWorkspace {
    pub fn create_in(parent: &Path) -> Result<Self> {
        fs::create_dir_all(parent)?;
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(parent)?;
        info!(path = %dir.path().display(), "created temporary directory");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory and everything in it, reporting failures instead
    /// of swallowing them like drop does.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        info!(path = %path.display(), "cleaning up temporary files");
        self.dir.close()?;
        debug!("temporary files cleaned up");
        Ok(())
    }
}

/// Decode `bytes` into RGBA8, sniffing the format from content.
///
/// Every enabled codec is recognised by its magic bytes, so content without a
/// known signature is undecodable rather than merely unlabelled.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let Some(format) = reader.format() else {
        error!("unrecognized image format");
        return Err(Error::Dimensions("unrecognized image format".to_string()));
    };
    debug!(format = ?format, "detected image format");

    let decoded = reader.decode().map_err(|e| {
        error!(error = %e, "could not decode image");
        Error::Dimensions(e.to_string())
    })?;

    if decoded.width() == 0 || decoded.height() == 0 {
        error!("could not determine image dimensions");
        return Err(Error::Dimensions("image has no pixels".to_string()));
    }

    Ok(decoded.into_rgba8())
}

/// Decode, validate and slice `bytes`, writing one PNG per cell into `out_dir`.
///
/// On error nothing is returned; files already written stay in `out_dir` for
/// its owner to remove.
pub fn process_image(bytes: &[u8], spec: TileSpec, out_dir: &Path) -> Result<Vec<TileArtifact>> {
    info!("starting image processing");
    let image = decode(bytes)?;
    debug!(width = image.width(), height = image.height(), "image dimensions");

    let grid = spec.grid(image.width(), image.height())?;
    info!(
        tiles_x = grid.tiles_x,
        tiles_y = grid.tiles_y,
        "image validation passed"
    );

    let tiles = cut_tiles(&image, grid, spec.tile_size, out_dir)?;
    info!(total_tiles = tiles.len(), "image processing completed");
    Ok(tiles)
}

fn cut_tiles(
    image: &RgbaImage,
    grid: TileGrid,
    tile_size: u32,
    out_dir: &Path,
) -> Result<Vec<TileArtifact>> {
    let mut tiles = Vec::with_capacity(grid.len() as usize);

    for (x, y) in grid.cells() {
        let path = out_dir.join(format!("tile_{x}_{y}.png"));
        debug!(x, y, path = %path.display(), "processing tile");

        let tile =
            imageops::crop_imm(image, x * tile_size, y * tile_size, tile_size, tile_size)
                .to_image();
        write_png(&tile, &path)?;

        tiles.push(TileArtifact { x, y, path });
    }

    Ok(tiles)
}

fn write_png(tile: &RgbaImage, path: &Path) -> Result<()> {
    let out = BufWriter::new(File::create(path)?);
    PngEncoder::new_with_quality(out, CompressionType::Best, FilterType::Adaptive).write_image(
        tile.as_raw(),
        tile.width(),
        tile.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(())
}
