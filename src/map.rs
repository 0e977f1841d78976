use std::path::PathBuf;

use crate::geom::Rect;

/// Horizontal flip flag (bit 31).
pub const FLIP_H: u32 = 0x8000_0000;
/// Vertical flip flag (bit 30).
pub const FLIP_V: u32 = 0x4000_0000;
/// Diagonal flip flag (bit 29).
pub const FLIP_D: u32 = 0x2000_0000;
/// Keeps the lower 29 bits (bit 28 is free).
pub const GID_MASK: u32 = 0x1FFF_FFFF;

/// A raw layer cell: a global tile id with the flip flags in the top bits.
/// Gid 0 is the nil tile marking an empty cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId(pub u32);

impl TileId {
    /// The empty-cell sentinel.
    pub const NIL: TileId = TileId(0);

    /// Raw value including flip bits.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Global tile id with the flip bits masked off.
    #[inline]
    pub fn gid(self) -> u32 {
        self.0 & GID_MASK
    }

    /// Horizontal flip flag.
    #[inline]
    pub fn flip_h(self) -> bool {
        (self.0 & FLIP_H) != 0
    }

    /// Vertical flip flag.
    #[inline]
    pub fn flip_v(self) -> bool {
        (self.0 & FLIP_V) != 0
    }

    /// Diagonal (transpose) flip flag.
    #[inline]
    pub fn flip_d(self) -> bool {
        (self.0 & FLIP_D) != 0
    }

    /// True for the empty-cell sentinel.
    #[inline]
    pub fn is_nil(self) -> bool {
        self.gid() == 0
    }
}

/// Map grid orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Rectangular grid
    Orthogonal,
    /// Isometric grid (not renderable)
    Isometric,
    /// Staggered isometric grid (not renderable)
    Staggered,
    /// Hexagonal grid
    Hexagonal,
}

/// Order in which layer cells are placed on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOrder {
    /// Left to right, top to bottom (the only renderable order)
    RightDown,
    /// Left to right, bottom to top
    RightUp,
    /// Right to left, top to bottom
    LeftDown,
    /// Right to left, bottom to top
    LeftUp,
}

/// For hexagonal maps, which axis is staggered to produce the hex pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaggerAxis {
    /// Columns are staggered
    X,
    /// Rows are staggered
    Y,
}

/// Where a tileset's pixels come from.
#[derive(Debug, Clone)]
pub enum TilesetSource {
    /// One image sliced into a uniform grid
    Atlas {
        /// Image path, relative to the tileset's base directory
        image: String,
    },
    /// A discrete image per tile
    Collection {
        /// Per-tile images, addressed by local tile id
        tiles: Vec<TileImage>,
    },
}

/// A single tile image inside a collection tileset.
#[derive(Debug, Clone)]
pub struct TileImage {
    /// Local tile id within the tileset
    pub id: u32,
    /// Image path, relative to the tileset's base directory
    pub image: String,
}

/// A reusable set of tile images addressed by a global id range.
#[derive(Debug, Clone)]
pub struct Tileset {
    /// Tileset name
    pub name: String,
    /// First global tile id covered by this tileset
    pub first_gid: u32,
    /// Number of tiles in the tileset
    pub tile_count: u32,
    /// Atlas columns (0 for collection tilesets)
    pub columns: u32,
    /// Tile width in pixels
    pub tile_width: u32,
    /// Tile height in pixels
    pub tile_height: u32,
    /// Pixels between atlas tiles
    pub spacing: u32,
    /// Pixels around the atlas edge
    pub margin: u32,
    /// Directory the image paths resolve against
    pub base_dir: PathBuf,
    /// Atlas image or per-tile images
    pub source: TilesetSource,
}

impl Tileset {
    /// Pixel rectangle of a tile inside the atlas image.
    pub fn tile_rect(&self, local_id: u32) -> Rect {
        let (col, row) = if self.columns > 0 {
            (local_id % self.columns, local_id / self.columns)
        } else {
            (local_id, 0)
        };
        Rect::new(
            self.margin + col * (self.tile_width + self.spacing),
            self.margin + row * (self.tile_height + self.spacing),
            self.tile_width,
            self.tile_height,
        )
    }

    /// Resolves a tileset-relative image path against the tileset's base
    /// directory.
    pub fn image_path(&self, relative: &str) -> PathBuf {
        self.base_dir.join(relative)
    }

    /// True if the given clean gid falls inside this tileset's id range.
    pub fn contains(&self, gid: u32) -> bool {
        gid >= self.first_gid && gid < self.first_gid + self.tile_count
    }
}

/// A full-grid tile layer.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Layer name
    pub name: String,
    /// Row-major cells, length = map width * height
    pub tiles: Vec<TileId>,
    /// Layer opacity in [0, 1]
    pub opacity: f32,
    /// Whether the layer takes part in [`render_visible_layers`](crate::Renderer::render_visible_layers)
    pub visible: bool,
}

/// A named container of layers.
#[derive(Debug, Clone)]
pub struct Group {
    /// Group name
    pub name: String,
    /// Layers in draw order
    pub layers: Vec<Layer>,
}

/// In-memory tile map model consumed by the renderer.
///
/// Produced by the JSON loader or built directly; the renderer treats it as
/// read-only.
#[derive(Debug, Clone)]
pub struct Map {
    /// Grid width in tiles
    pub width: u32,
    /// Grid height in tiles
    pub height: u32,
    /// Tile width in pixels
    pub tile_width: u32,
    /// Tile height in pixels
    pub tile_height: u32,
    /// Grid orientation
    pub orientation: Orientation,
    /// Cell placement order
    pub render_order: RenderOrder,
    /// Staggered axis (hexagonal maps only)
    pub stagger_axis: Option<StaggerAxis>,
    /// Hex tile side length in pixels (hexagonal maps only)
    pub hex_side_length: u32,
    /// Top-level layers in draw order
    pub layers: Vec<Layer>,
    /// Layer groups
    pub groups: Vec<Group>,
    /// Tilesets, sorted by first gid with non-overlapping id ranges
    pub tilesets: Vec<Tileset>,
}

impl Map {
    /// Finds the tileset covering a tile id, returning it together with the
    /// tile's local id. Returns `None` for the nil tile and for gids no
    /// tileset covers.
    pub fn tileset_for_gid(&self, id: TileId) -> Option<(&Tileset, u32)> {
        let gid = id.gid();
        if gid == 0 {
            return None;
        }
        self.tilesets
            .iter()
            .find(|ts| ts.contains(gid))
            .map(|ts| (ts, gid - ts.first_gid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atlas_tileset(first_gid: u32, count: u32) -> Tileset {
        Tileset {
            name: String::new(),
            first_gid,
            tile_count: count,
            columns: 4,
            tile_width: 8,
            tile_height: 8,
            spacing: 0,
            margin: 0,
            base_dir: PathBuf::new(),
            source: TilesetSource::Atlas {
                image: "tiles.png".into(),
            },
        }
    }

    #[test]
    fn tile_id_flags() {
        let id = TileId(5 | FLIP_H | FLIP_D);
        assert_eq!(id.gid(), 5);
        assert!(id.flip_h());
        assert!(!id.flip_v());
        assert!(id.flip_d());
        assert!(!id.is_nil());
        assert!(TileId::NIL.is_nil());
        // Flip bits alone do not make a cell non-empty.
        assert!(TileId(FLIP_H).is_nil());
    }

    #[test]
    fn tile_rect_honours_margin_and_spacing() {
        let mut ts = atlas_tileset(1, 8);
        ts.spacing = 2;
        ts.margin = 3;
        let r = ts.tile_rect(5); // column 1, row 1
        assert_eq!(r, Rect::new(3 + 10, 3 + 10, 8, 8));
    }

    #[test]
    fn tileset_lookup_by_gid() {
        let map = Map {
            width: 1,
            height: 1,
            tile_width: 8,
            tile_height: 8,
            orientation: Orientation::Orthogonal,
            render_order: RenderOrder::RightDown,
            stagger_axis: None,
            hex_side_length: 0,
            layers: Vec::new(),
            groups: Vec::new(),
            tilesets: vec![atlas_tileset(1, 4), atlas_tileset(5, 4)],
        };

        let (ts, local) = map.tileset_for_gid(TileId(6)).unwrap();
        assert_eq!(ts.first_gid, 5);
        assert_eq!(local, 1);
        assert!(map.tileset_for_gid(TileId(9)).is_none());
        assert!(map.tileset_for_gid(TileId::NIL).is_none());
    }
}
