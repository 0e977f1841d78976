use crate::geom::Rect;
use crate::map::Map;
use crate::render::engine::RendererEngine;
use crate::render::renderer::Bounds;

/// Geometry engine for orthogonal (rectangular grid) maps.
#[derive(Debug)]
pub struct OrthogonalEngine {
    tile_width: u32,
    tile_height: u32,
}

impl OrthogonalEngine {
    /// Creates the engine from the map's tile dimensions.
    pub fn new(map: &Map) -> Self {
        OrthogonalEngine {
            tile_width: map.tile_width,
            tile_height: map.tile_height,
        }
    }
}

impl RendererEngine for OrthogonalEngine {
    fn final_image_size(&self, bounds: Bounds) -> Rect {
        Rect::new(
            0,
            0,
            bounds.limit_x() * self.tile_width,
            bounds.limit_y() * self.tile_height,
        )
    }

    fn tile_position(&self, x: u32, y: u32, _start_odd: bool) -> Rect {
        Rect::new(
            x * self.tile_width,
            y * self.tile_height,
            self.tile_width,
            self.tile_height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> OrthogonalEngine {
        OrthogonalEngine {
            tile_width: 16,
            tile_height: 8,
        }
    }

    #[test]
    fn final_size_is_limit_times_tile_size() {
        let mut bounds = Bounds::default();
        bounds.set_limit(4, 3);
        assert_eq!(engine().final_image_size(bounds), Rect::new(0, 0, 64, 24));
    }

    #[test]
    fn tile_position_is_grid_aligned() {
        let e = engine();
        assert_eq!(e.tile_position(0, 0, false), Rect::new(0, 0, 16, 8));
        assert_eq!(e.tile_position(2, 3, false), Rect::new(32, 24, 16, 8));
        // Parity anchoring only matters for staggered grids.
        assert_eq!(e.tile_position(2, 3, true), e.tile_position(2, 3, false));
    }
}
