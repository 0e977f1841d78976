use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{imageops, DynamicImage, ExtendedColorType, ImageEncoder, Pixel, RgbaImage};
use tracing::{debug, trace};

use crate::error::Error;
use crate::geom::Rect;
use crate::map::{Layer, Map, Orientation, RenderOrder, Tileset, TilesetSource};
use crate::render::engine::RendererEngine;
use crate::render::hexagonal::HexagonalEngine;
use crate::render::orthogonal::OrthogonalEngine;

/// The tile-space sub-rectangle of the map being rendered.
///
/// Offsets clamp at zero on every mutation; limits only change for requests
/// of at least one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    offset_x: u32,
    offset_y: u32,
    limit_x: u32,
    limit_y: u32,
}

impl Bounds {
    /// Viewport x offset in tiles.
    pub fn offset_x(&self) -> u32 {
        self.offset_x
    }

    /// Viewport y offset in tiles.
    pub fn offset_y(&self) -> u32 {
        self.offset_y
    }

    /// Viewport width in tiles.
    pub fn limit_x(&self) -> u32 {
        self.limit_x
    }

    /// Viewport height in tiles.
    pub fn limit_y(&self) -> u32 {
        self.limit_y
    }

    /// Sets the viewport size in tiles. A component below one leaves the
    /// previous limit unchanged.
    pub fn set_limit(&mut self, x: i32, y: i32) {
        if x >= 1 {
            self.limit_x = x as u32;
        }
        if y >= 1 {
            self.limit_y = y as u32;
        }
    }

    /// Pans the viewport by a relative amount in tiles, clamping each offset
    /// at zero.
    pub fn add_offset(&mut self, x: i32, y: i32) {
        self.offset_x = self.offset_x.saturating_add_signed(x);
        self.offset_y = self.offset_y.saturating_add_signed(y);
    }
}

/// Pluggable file access used to resolve tileset image paths. Without one,
/// the renderer opens paths from the local disk.
pub trait FileSystem {
    /// Opens a file for reading.
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read>>;
}

impl<T: FileSystem + ?Sized> FileSystem for &T {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        (**self).open(path)
    }
}

/// Composites map layers into an RGBA image.
///
/// The renderer owns the output buffer and a tile image cache that grows for
/// its whole lifetime; render calls mutate both in place, so concurrent use
/// needs one renderer per caller.
pub struct Renderer<'m> {
    map: &'m Map,
    engine: Box<dyn RendererEngine>,
    bounds: Bounds,
    result: RgbaImage,
    tile_cache: HashMap<u32, RgbaImage>,
    fs: Option<Box<dyn FileSystem + 'm>>,
}

impl<'m> Renderer<'m> {
    /// Creates a renderer for the map, resolving tileset images from the
    /// local disk. Fails for orientations without a geometry engine.
    pub fn new(map: &'m Map) -> Result<Self, Error> {
        Self::build(map, None)
    }

    /// Creates a renderer that resolves tileset images through a custom
    /// file system.
    pub fn with_file_system(map: &'m Map, fs: impl FileSystem + 'm) -> Result<Self, Error> {
        Self::build(map, Some(Box::new(fs)))
    }

    fn build(map: &'m Map, fs: Option<Box<dyn FileSystem + 'm>>) -> Result<Self, Error> {
        let engine: Box<dyn RendererEngine> = match map.orientation {
            Orientation::Orthogonal => Box::new(OrthogonalEngine::new(map)),
            Orientation::Hexagonal => Box::new(HexagonalEngine::new(map)),
            Orientation::Isometric | Orientation::Staggered => {
                return Err(Error::UnsupportedOrientation)
            }
        };
        let bounds = Bounds {
            offset_x: 0,
            offset_y: 0,
            limit_x: map.width,
            limit_y: map.height,
        };
        let mut renderer = Renderer {
            map,
            engine,
            bounds,
            result: RgbaImage::new(0, 0),
            tile_cache: HashMap::new(),
            fs,
        };
        renderer.clear();
        Ok(renderer)
    }

    /// The composited image.
    pub fn image(&self) -> &RgbaImage {
        &self.result
    }

    /// Consumes the renderer, returning the composited image.
    pub fn into_image(self) -> RgbaImage {
        self.result
    }

    /// The current viewport.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Sets the viewport size in tiles; components below one are ignored.
    /// Takes effect at the next [`clear`](Self::clear).
    pub fn set_limit(&mut self, x: i32, y: i32) {
        self.bounds.set_limit(x, y);
    }

    /// Pans the viewport, clamping offsets at zero.
    pub fn add_offset(&mut self, x: i32, y: i32) {
        self.bounds.add_offset(x, y);
    }

    /// Replaces the output buffer with a fresh transparent one sized to the
    /// current viewport. Renders accumulate on the buffer, so clearing
    /// between renders separates layers: render, copy the image, clear,
    /// repeat.
    pub fn clear(&mut self) {
        let size = self.engine.final_image_size(self.bounds);
        self.result = RgbaImage::new(size.width, size.height);
    }

    /// Renders a single top-level layer onto the output buffer.
    pub fn render_layer(&mut self, index: usize) -> Result<(), Error> {
        let m = self.map;
        let layer = m.layers.get(index).ok_or(Error::OutOfBounds)?;
        self.render_tiles(layer)
    }

    /// Renders a single layer from a group.
    pub fn render_group_layer(&mut self, group_index: usize, layer_index: usize) -> Result<(), Error> {
        let m = self.map;
        let group = m.groups.get(group_index).ok_or(Error::OutOfBounds)?;
        let layer = group.layers.get(layer_index).ok_or(Error::OutOfBounds)?;
        self.render_tiles(layer)
    }

    /// Renders every visible top-level layer in stored order; later layers
    /// draw over earlier ones.
    pub fn render_visible_layers(&mut self) -> Result<(), Error> {
        let m = self.map;
        for layer in &m.layers {
            if !layer.visible {
                continue;
            }
            self.render_tiles(layer)?;
        }
        Ok(())
    }

    /// Writes the output buffer as a PNG image.
    pub fn save_as_png<W: Write>(&self, writer: W) -> Result<(), Error> {
        PngEncoder::new(writer).write_image(
            self.result.as_raw(),
            self.result.width(),
            self.result.height(),
            ExtendedColorType::Rgba8,
        )?;
        Ok(())
    }

    /// Writes the output buffer as a JPEG image with the given quality
    /// (1-100). JPEG has no alpha channel, so transparency is dropped.
    pub fn save_as_jpeg<W: Write>(&self, writer: W, quality: u8) -> Result<(), Error> {
        let rgb = DynamicImage::ImageRgba8(self.result.clone()).to_rgb8();
        JpegEncoder::new_with_quality(writer, quality).encode_image(&rgb)?;
        Ok(())
    }

    /// Writes the output buffer as a GIF image with the given quantization
    /// speed (1-30).
    pub fn save_as_gif<W: Write>(&self, writer: W, speed: i32) -> Result<(), Error> {
        GifEncoder::new_with_speed(writer, speed).encode(
            self.result.as_raw(),
            self.result.width(),
            self.result.height(),
            ExtendedColorType::Rgba8,
        )?;
        Ok(())
    }

    fn render_tiles(&mut self, layer: &Layer) -> Result<(), Error> {
        let m = self.map;
        if m.render_order != RenderOrder::RightDown {
            return Err(Error::UnsupportedRenderOrder);
        }

        let xs = self.bounds.offset_x;
        let xe = (xs + self.bounds.limit_x).min(m.width);
        let ys = self.bounds.offset_y;
        let ye = (ys + self.bounds.limit_y).min(m.height);
        // Stagger parity stays anchored to the map when panned to an odd row.
        let start_odd = ys % 2 == 1;
        let mask = if layer.opacity < 1.0 {
            (layer.opacity.clamp(0.0, 1.0) * 255.0) as u8
        } else {
            255
        };

        trace!(layer = %layer.name, xs, ys, xe, ye, "rendering layer");
        for y in ys..ye {
            for x in xs..xe {
                let i = (y * m.width + x) as usize;
                let Some(&id) = layer.tiles.get(i) else {
                    continue;
                };
                if id.is_nil() {
                    continue;
                }
                let Some((tileset, _)) = m.tileset_for_gid(id) else {
                    continue;
                };
                if !self.tile_cache.contains_key(&id.gid()) {
                    self.populate_tileset(tileset)?;
                }
                let Some(cached) = self.tile_cache.get(&id.gid()) else {
                    continue;
                };
                let img = self.engine.rotate_tile_image(id, cached);
                let pos = self.engine.tile_position(x - xs, y - ys, start_odd);
                blit(&mut self.result, &img, pos, mask);
            }
        }
        Ok(())
    }

    /// Caches every tile of the tileset in one pass; opening and decoding
    /// the backing image is the expensive step, not the crop.
    fn populate_tileset(&mut self, tileset: &Tileset) -> Result<(), Error> {
        match &tileset.source {
            TilesetSource::Atlas { image } => {
                let atlas = self.decode(&tileset.image_path(image))?;
                debug!(
                    tileset = %tileset.name,
                    first_gid = tileset.first_gid,
                    count = tileset.tile_count,
                    "caching tileset atlas"
                );
                for i in 0..tileset.tile_count {
                    let r = tileset.tile_rect(i);
                    let tile = imageops::crop_imm(&atlas, r.x, r.y, r.width, r.height).to_image();
                    self.tile_cache.insert(tileset.first_gid + i, tile);
                }
            }
            TilesetSource::Collection { tiles } => {
                debug!(
                    tileset = %tileset.name,
                    first_gid = tileset.first_gid,
                    count = tiles.len(),
                    "caching tileset images"
                );
                for tile in tiles {
                    let img = self.decode(&tileset.image_path(&tile.image))?;
                    self.tile_cache.insert(tileset.first_gid + tile.id, img);
                }
            }
        }
        Ok(())
    }

    fn decode(&self, path: &Path) -> Result<RgbaImage, Error> {
        let mut reader = self.open(path)?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(image::load_from_memory(&buf)?.to_rgba8())
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        match &self.fs {
            Some(fs) => fs.open(path),
            None => Ok(Box::new(File::open(path)?)),
        }
    }
}

/// Source-over blend of `src` into `dest` at `pos`, clipping to both the
/// destination rectangle and the buffer. `mask` scales source alpha for
/// layer opacity.
fn blit(dest: &mut RgbaImage, src: &RgbaImage, pos: Rect, mask: u8) {
    let w = src.width().min(pos.width);
    let h = src.height().min(pos.height);
    for sy in 0..h {
        let dy = pos.y + sy;
        if dy >= dest.height() {
            break;
        }
        for sx in 0..w {
            let dx = pos.x + sx;
            if dx >= dest.width() {
                break;
            }
            let mut px = *src.get_pixel(sx, sy);
            if mask < 255 {
                px.0[3] = ((px.0[3] as u16 * mask as u16) / 255) as u8;
            }
            dest.get_pixel_mut(dx, dy).blend(&px);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn limit_ignores_non_positive_values() {
        let mut b = Bounds::default();
        b.set_limit(10, 20);
        b.set_limit(0, -5);
        assert_eq!(b.limit_x(), 10);
        assert_eq!(b.limit_y(), 20);
        b.set_limit(-1, 7);
        assert_eq!(b.limit_x(), 10);
        assert_eq!(b.limit_y(), 7);
    }

    #[test]
    fn offset_never_goes_negative() {
        let mut b = Bounds::default();
        b.add_offset(-100, -100);
        assert_eq!((b.offset_x(), b.offset_y()), (0, 0));
        b.add_offset(3, 5);
        b.add_offset(-1, -10);
        assert_eq!((b.offset_x(), b.offset_y()), (2, 0));
    }

    #[test]
    fn blit_clips_to_destination_rect_and_buffer() {
        let mut dest = RgbaImage::new(4, 4);
        let src = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        blit(&mut dest, &src, Rect::new(2, 2, 2, 2), 255);
        assert_eq!(dest.get_pixel(1, 1).0[3], 0);
        assert_eq!(*dest.get_pixel(2, 2), Rgba([10, 20, 30, 255]));
        assert_eq!(*dest.get_pixel(3, 3), Rgba([10, 20, 30, 255]));
        // Off-buffer placement draws nothing and does not panic.
        blit(&mut dest, &src, Rect::new(10, 10, 4, 4), 255);
    }

    #[test]
    fn blit_mask_scales_source_alpha() {
        let mut dest = RgbaImage::new(1, 1);
        let src = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 255]));
        blit(&mut dest, &src, Rect::new(0, 0, 1, 1), 127);
        assert_eq!(dest.get_pixel(0, 0).0[3], 127);
    }
}
