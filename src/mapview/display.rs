use image::RgbImage;
use log::debug;
use speedy2d::dimen::Vector2;

use super::error::{MapViewError, Result};
use super::grid::Grid;
use super::raster::Rasterizer;

/// Owns the image shown in the window. The size is fixed by the first grid.
#[derive(Debug)]
pub struct DisplaySurface {
    rasterizer: Rasterizer,
    grid_dimensions: (usize, usize),
    image: RgbImage,
    revision: u64,
}

impl DisplaySurface {
    pub fn new(grid: &Grid, rasterizer: Rasterizer) -> Result<DisplaySurface> {
        let image = rasterizer.rasterize(grid)?;
        debug!(
            "Created {}x{} display surface for {}x{} grid at scale {}",
            image.width(),
            image.height(),
            grid.width(),
            grid.height(),
            rasterizer.scale()
        );

        Ok(DisplaySurface {
            rasterizer,
            grid_dimensions: grid.dimensions(),
            image,
            revision: 0,
        })
    }
}

impl DisplaySurface {
    /// Replaces the displayed image with a rendering of `grid`. A grid of different
    /// dimensions is rejected and the current image is kept.
    pub fn replace(&mut self, grid: &Grid) -> Result<()> {
        if grid.dimensions() != self.grid_dimensions {
            let (expected_width, expected_height) = self.grid_dimensions;
            let (found_width, found_height) = grid.dimensions();
            return Err(MapViewError::DimensionMismatch {
                expected_width: expected_width as u32,
                expected_height: expected_height as u32,
                found_width: found_width as u32,
                found_height: found_height as u32,
            });
        }

        self.rasterizer.rasterize_into(grid, &mut self.image)?;
        self.revision += 1;
        Ok(())
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    // size in physical pixels
    pub fn size(&self) -> Vector2<u32> {
        Vector2::new(self.image.width(), self.image.height())
    }

    pub fn grid_dimensions(&self) -> (usize, usize) {
        self.grid_dimensions
    }

    /// Number of successful replacements since construction.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
