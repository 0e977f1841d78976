use std::borrow::Cow;

use image::{imageops, RgbaImage};

use crate::geom::Rect;
use crate::map::TileId;
use crate::render::renderer::Bounds;

/// Per-orientation coordinate math. One implementation exists per renderable
/// map orientation; the renderer picks one at construction and stays
/// orientation-agnostic afterwards.
pub trait RendererEngine {
    /// Pixel size of the output buffer for the given viewport. Returns
    /// [`Rect::EMPTY`] for an unsupported geometry configuration.
    fn final_image_size(&self, bounds: Bounds) -> Rect;

    /// Destination pixel rectangle for a viewport-relative tile coordinate.
    /// `start_odd` anchors stagger parity to the map when the viewport
    /// starts on an odd row.
    fn tile_position(&self, x: u32, y: u32, start_odd: bool) -> Rect;

    /// Applies a tile's flip flags to its image: horizontal, then vertical,
    /// then the diagonal flip as a 90 degree rotation followed by a
    /// horizontal mirror (Tiled's diagonal flip is a transpose). Returns the
    /// input untouched when no flag is set.
    fn rotate_tile_image<'a>(&self, tile: TileId, img: &'a RgbaImage) -> Cow<'a, RgbaImage> {
        let mut out = Cow::Borrowed(img);
        if tile.flip_h() {
            out = Cow::Owned(imageops::flip_horizontal(out.as_ref()));
        }
        if tile.flip_v() {
            out = Cow::Owned(imageops::flip_vertical(out.as_ref()));
        }
        if tile.flip_d() {
            out = Cow::Owned(imageops::flip_horizontal(&imageops::rotate90(out.as_ref())));
        }
        out
    }
}
