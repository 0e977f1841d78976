#![warn(missing_docs)]

//! Headless raster renderer for Tiled JSON maps.
//!
//! Loads a map model from Tiled's JSON export (or takes one built in code)
//! and composites its tile layers into an RGBA image that can be written out
//! as PNG, JPEG or GIF.

mod error;
mod geom;
mod loader {
    pub mod json_loader;
}
mod map;
mod render {
    pub mod engine;
    pub mod hexagonal;
    pub mod orthogonal;
    pub mod renderer;
}

pub use error::Error;
pub use geom::Rect;
pub use loader::json_loader::{load_map_file, load_map_str};
pub use map::{
    Group, Layer, Map, Orientation, RenderOrder, StaggerAxis, TileId, TileImage, Tileset,
    TilesetSource, FLIP_D, FLIP_H, FLIP_V, GID_MASK,
};
pub use render::engine::RendererEngine;
pub use render::hexagonal::HexagonalEngine;
pub use render::orthogonal::OrthogonalEngine;
pub use render::renderer::{Bounds, FileSystem, Renderer};
