//! Shadow Atlas Layout
//!
//! Both shadow atlases are single square depth textures divided into a square
//! grid of equally sized tiles. The grid is 1x1, 2x2 or 4x4 depending on how
//! many tiles the frame needs; the directional and other-light atlases pick
//! their grids independently.
//!
//! Tiles are numbered row-major from the atlas origin, so tile `i` sits at
//! column `i % split`, row `i / split`.

use glam::Vec2;
use serde::{Serialize, Deserialize};

/// Which of the two shadow atlases
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtlasKind {
    /// Directional light cascades
    Directional,
    /// Spot lights and point light cube faces
    Other,
}

/// Pixel rectangle of a tile inside an atlas
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Grid subdivision of one atlas for one frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasLayout {
    /// Atlas edge length in texels
    pub resolution: u32,

    /// Tiles per row and column (1, 2 or 4)
    pub split: u32,

    /// Tile edge length in texels
    pub tile_size: u32,
}

impl AtlasLayout {
    /// Pick the smallest grid that holds `tile_count` tiles
    ///
    /// Counts beyond 16 are not expected (reservation capacity prevents them)
    /// and still get the 4x4 grid. Resolutions too small for the grid are not
    /// rejected; tiles bottom out at one texel.
    pub fn for_count(tile_count: usize, resolution: u32) -> Self {
        let split = Self::split_for(tile_count);
        Self {
            resolution,
            split,
            tile_size: (resolution / split).max(1),
        }
    }

    /// Grid split for a tile count
    pub fn split_for(tile_count: usize) -> u32 {
        match tile_count {
            0..=1 => 1,
            2..=4 => 2,
            _ => 4,
        }
    }

    /// Number of tiles the grid holds
    pub fn capacity(&self) -> usize {
        (self.split * self.split) as usize
    }

    /// Grid coordinates of a tile, in tile units
    pub fn tile_offset(&self, tile_index: usize) -> Vec2 {
        let split = self.split as usize;
        Vec2::new((tile_index % split) as f32, (tile_index / split) as f32)
    }

    /// Pixel rectangle of a tile
    pub fn tile_rect(&self, tile_index: usize) -> TileRect {
        let offset = self.tile_offset(tile_index);
        TileRect {
            x: offset.x as u32 * self.tile_size,
            y: offset.y as u32 * self.tile_size,
            width: self.tile_size,
            height: self.tile_size,
        }
    }

    /// Fraction of the atlas covered by one tile edge
    pub fn tile_scale(&self) -> f32 {
        1.0 / self.split as f32
    }

    /// Texel size of the whole atlas in UV units
    pub fn texel_size(&self) -> f32 {
        1.0 / self.resolution as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_covers_count() {
        for n in 0..=16 {
            let split = AtlasLayout::split_for(n);
            assert!(matches!(split, 1 | 2 | 4));
            assert!((split * split) as usize >= n);
        }
    }

    #[test]
    fn test_split_monotonic() {
        let mut previous = 1;
        for n in 0..=32 {
            let split = AtlasLayout::split_for(n);
            assert!(split >= previous);
            previous = split;
        }
    }

    #[test]
    fn test_smallest_split_wins() {
        assert_eq!(AtlasLayout::split_for(1), 1);
        assert_eq!(AtlasLayout::split_for(2), 2);
        assert_eq!(AtlasLayout::split_for(4), 2);
        assert_eq!(AtlasLayout::split_for(5), 4);
        assert_eq!(AtlasLayout::split_for(16), 4);
    }

    #[test]
    fn test_four_cascades_one_light() {
        let layout = AtlasLayout::for_count(4, 2048);
        assert_eq!(layout.split, 2);
        assert_eq!(layout.tile_size, 1024);
        assert_eq!(layout.capacity(), 4);
    }

    #[test]
    fn test_tile_rects() {
        let layout = AtlasLayout::for_count(16, 1024);
        assert_eq!(layout.tile_rect(0), TileRect { x: 0, y: 0, width: 256, height: 256 });
        assert_eq!(layout.tile_rect(5), TileRect { x: 256, y: 256, width: 256, height: 256 });
        assert_eq!(layout.tile_rect(7), TileRect { x: 768, y: 256, width: 256, height: 256 });
        assert_eq!(layout.tile_offset(14), Vec2::new(2.0, 3.0));
    }

    #[test]
    fn test_degenerate_resolution() {
        // Untrusted configs produce tiny tiles instead of failing
        let layout = AtlasLayout::for_count(16, 2);
        assert_eq!(layout.tile_size, 1);
        let layout = AtlasLayout::for_count(4, 1);
        assert_eq!(layout.tile_size, 1);
    }
}
