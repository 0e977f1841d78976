use crate::geom::Rect;
use crate::map::{Map, StaggerAxis};
use crate::render::engine::RendererEngine;
use crate::render::renderer::Bounds;

/// Geometry engine for hexagonal maps.
///
/// Tile destination rectangles deliberately span two tile heights (stagger
/// axis X) or widths (stagger axis Y): hex tile images overlap into the
/// neighbouring row or column.
#[derive(Debug)]
pub struct HexagonalEngine {
    tile_width: u32,
    tile_height: u32,
    hex_side_length: u32,
    stagger_axis: Option<StaggerAxis>,
}

impl HexagonalEngine {
    /// Creates the engine from the map's hex geometry.
    pub fn new(map: &Map) -> Self {
        HexagonalEngine {
            tile_width: map.tile_width,
            tile_height: map.tile_height,
            hex_side_length: map.hex_side_length,
            stagger_axis: map.stagger_axis,
        }
    }
}

impl RendererEngine for HexagonalEngine {
    fn final_image_size(&self, bounds: Bounds) -> Rect {
        match self.stagger_axis {
            Some(StaggerAxis::X) => {
                let addon = self.tile_width.saturating_sub(self.hex_side_length) / 2;
                Rect::new(
                    0,
                    0,
                    bounds.limit_x() * (self.tile_width - addon) + addon,
                    bounds.limit_y() * self.tile_height + self.tile_height / 2,
                )
            }
            Some(StaggerAxis::Y) => {
                let addon = self.tile_height.saturating_sub(self.hex_side_length) / 2;
                Rect::new(
                    0,
                    0,
                    bounds.limit_x() * self.tile_width + self.tile_width / 2,
                    bounds.limit_y() * (self.tile_height - addon) + addon,
                )
            }
            None => Rect::EMPTY,
        }
    }

    fn tile_position(&self, x: u32, y: u32, start_odd: bool) -> Rect {
        // Parity is anchored to the map row, not the viewport row: a
        // viewport starting on an odd row flips the check value.
        let odd_check = if start_odd { 0 } else { 1 };
        match self.stagger_axis {
            Some(StaggerAxis::X) => {
                let offset_width =
                    self.tile_width.saturating_sub(self.hex_side_length) / 2 + self.hex_side_length;
                let bump = if x % 2 == odd_check {
                    self.tile_height / 2
                } else {
                    0
                };
                Rect::new(
                    x * offset_width,
                    y * self.tile_height + bump,
                    self.tile_width,
                    2 * self.tile_height,
                )
            }
            Some(StaggerAxis::Y) => {
                let offset_height = self.tile_height.saturating_sub(self.hex_side_length) / 2
                    + self.hex_side_length;
                let bump = if y % 2 == odd_check {
                    self.tile_width / 2
                } else {
                    0
                };
                Rect::new(
                    x * self.tile_width + bump,
                    y * offset_height,
                    2 * self.tile_width,
                    offset_height + self.tile_height,
                )
            }
            None => Rect::EMPTY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(axis: Option<StaggerAxis>) -> HexagonalEngine {
        HexagonalEngine {
            tile_width: 14,
            tile_height: 12,
            hex_side_length: 6,
            stagger_axis: axis,
        }
    }

    fn bounds(x: i32, y: i32) -> Bounds {
        let mut b = Bounds::default();
        b.set_limit(x, y);
        b
    }

    #[test]
    fn final_size_stagger_x() {
        // addon = (14 - 6) / 2 = 4
        let size = engine(Some(StaggerAxis::X)).final_image_size(bounds(3, 2));
        assert_eq!(size.width, 3 * (14 - 4) + 4);
        assert_eq!(size.height, 2 * 12 + 6);
    }

    #[test]
    fn final_size_stagger_y() {
        // addon = (12 - 6) / 2 = 3
        let size = engine(Some(StaggerAxis::Y)).final_image_size(bounds(3, 2));
        assert_eq!(size.width, 3 * 14 + 7);
        assert_eq!(size.height, 2 * (12 - 3) + 3);
    }

    #[test]
    fn missing_stagger_axis_yields_empty_rect() {
        let e = engine(None);
        assert!(e.final_image_size(bounds(3, 2)).is_empty());
        assert!(e.tile_position(0, 0, false).is_empty());
    }

    #[test]
    fn stagger_x_bumps_odd_columns() {
        let e = engine(Some(StaggerAxis::X));
        // offset_width = (14 - 6) / 2 + 6 = 10
        let even = e.tile_position(0, 0, false);
        let odd = e.tile_position(1, 0, false);
        assert_eq!(even, Rect::new(0, 0, 14, 24));
        assert_eq!(odd, Rect::new(10, 6, 14, 24));
    }

    #[test]
    fn stagger_x_start_odd_flips_parity() {
        let e = engine(Some(StaggerAxis::X));
        // With the viewport anchored on an odd map row, even viewport
        // columns take the bump instead.
        let even = e.tile_position(0, 0, true);
        let odd = e.tile_position(1, 0, true);
        assert_eq!(even.y, 6);
        assert_eq!(odd.y, 0);
    }

    #[test]
    fn stagger_y_bumps_odd_rows() {
        let e = engine(Some(StaggerAxis::Y));
        // offset_height = (12 - 6) / 2 + 6 = 9
        let even = e.tile_position(0, 0, false);
        let odd = e.tile_position(0, 1, false);
        assert_eq!(even, Rect::new(0, 0, 28, 21));
        assert_eq!(odd, Rect::new(7, 9, 28, 21));
    }
}
