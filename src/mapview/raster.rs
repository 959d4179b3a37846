use image::{Rgb, RgbImage};
use itertools::iproduct;

use super::error::{MapViewError, Result};
use super::grid::Grid;

/// Maps a cell value to a gray level. Values outside 0..=255 are clamped.
pub fn intensity(value: i32) -> u8 {
    value.clamp(u8::MIN as i32, u8::MAX as i32) as u8
}

/// Largest image side accepted, in pixels. Textures beyond this are not uploadable
/// on common GPUs.
pub const MAX_IMAGE_SIDE: u32 = 16384;

/// Nearest-neighbour upscaler: each cell becomes a `scale`x`scale` block of
/// identical gray pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rasterizer {
    scale: u32,
}

impl Rasterizer {
    pub fn new(scale: u32) -> Result<Rasterizer> {
        if scale == 0 {
            return Err(MapViewError::InvalidScale(scale));
        }
        Ok(Rasterizer { scale })
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// (width, height) of the image for `grid`, or `ImageTooLarge` if either side
    /// exceeds `MAX_IMAGE_SIDE`.
    pub fn image_size(&self, grid: &Grid) -> Result<(u32, u32)> {
        let side = |cells: usize| {
            u32::try_from(cells)
                .ok()
                .and_then(|cells| cells.checked_mul(self.scale))
                .filter(|pixels| *pixels <= MAX_IMAGE_SIDE)
        };
        match (side(grid.width()), side(grid.height())) {
            (Some(width), Some(height)) => Ok((width, height)),
            _ => Err(MapViewError::ImageTooLarge {
                width: grid.width(),
                height: grid.height(),
                scale: self.scale,
            }),
        }
    }

    pub fn rasterize(&self, grid: &Grid) -> Result<RgbImage> {
        let (width, height) = self.image_size(grid)?;
        let mut image = RgbImage::new(width, height);
        self.fill(grid, &mut image);
        Ok(image)
    }

    /// Redraws `image` in place. Fails without touching the buffer if its size does
    /// not match the grid.
    pub fn rasterize_into(&self, grid: &Grid, image: &mut RgbImage) -> Result<()> {
        let (width, height) = self.image_size(grid)?;
        if image.dimensions() != (width, height) {
            return Err(MapViewError::DimensionMismatch {
                expected_width: image.width(),
                expected_height: image.height(),
                found_width: width,
                found_height: height,
            });
        }
        self.fill(grid, image);
        Ok(())
    }

    fn fill(&self, grid: &Grid, image: &mut RgbImage) {
        let scale = self.scale;
        for (row_idx, row) in grid.rows().enumerate() {
            for (column, &value) in row.iter().enumerate() {
                let gray = intensity(value);
                let color = Rgb([gray, gray, gray]);
                let x0 = column as u32 * scale;
                let y0 = row_idx as u32 * scale;
                for (i, j) in iproduct!(0..scale, 0..scale) {
                    image.put_pixel(x0 + j, y0 + i, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grid() -> Grid {
        Grid::from_rows(vec![vec![0, 128, 255], vec![255, 128, 0]]).unwrap()
    }

    #[test]
    fn zero_scale_is_rejected() {
        assert!(matches!(Rasterizer::new(0), Err(MapViewError::InvalidScale(0))));
    }

    #[test]
    fn image_size_is_grid_times_scale() {
        let grid = sample_grid();
        for scale in 1..=5 {
            let image = Rasterizer::new(scale).unwrap().rasterize(&grid).unwrap();
            assert_eq!(image.dimensions(), (3 * scale, 2 * scale));
        }
    }

    #[test]
    fn scale_one_maps_pixels_one_to_one() {
        let image = Rasterizer::new(1).unwrap().rasterize(&sample_grid()).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(*image.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*image.get_pixel(1, 0), Rgb([128, 128, 128]));
        assert_eq!(*image.get_pixel(2, 0), Rgb([255, 255, 255]));
        assert_eq!(*image.get_pixel(0, 1), Rgb([255, 255, 255]));
        assert_eq!(*image.get_pixel(1, 1), Rgb([128, 128, 128]));
        assert_eq!(*image.get_pixel(2, 1), Rgb([0, 0, 0]));
    }

    #[test]
    fn every_pixel_in_a_block_matches_its_cell() {
        let grid = Grid::from_rows(vec![vec![10, 20], vec![30, 40], vec![50, 60]]).unwrap();
        let scale = 3;
        let image = Rasterizer::new(scale).unwrap().rasterize(&grid).unwrap();

        for r in 0..grid.height() {
            for c in 0..grid.width() {
                let v = grid.get(r, c).unwrap() as u8;
                for (i, j) in iproduct!(0..scale, 0..scale) {
                    let x = c as u32 * scale + j;
                    let y = r as u32 * scale + i;
                    assert_eq!(*image.get_pixel(x, y), Rgb([v, v, v]), "pixel ({}, {})", x, y);
                }
            }
        }
    }

    #[test]
    fn single_cell_gives_uniform_block() {
        let grid = Grid::from_rows(vec![vec![77]]).unwrap();
        let image = Rasterizer::new(4).unwrap().rasterize(&grid).unwrap();
        assert_eq!(image.dimensions(), (4, 4));
        assert!(image.pixels().all(|pixel| *pixel == Rgb([77, 77, 77])));
    }

    #[test]
    fn rasterizing_twice_is_bit_identical() {
        let rasterizer = Rasterizer::new(2).unwrap();
        let grid = sample_grid();
        let first = rasterizer.rasterize(&grid).unwrap();

        let mut reused = rasterizer.rasterize(&grid).unwrap();
        rasterizer.rasterize_into(&grid, &mut reused).unwrap();
        assert_eq!(first.as_raw(), reused.as_raw());
    }

    #[test]
    fn rasterize_into_overwrites_previous_contents() {
        let rasterizer = Rasterizer::new(2).unwrap();
        let mut image = rasterizer.rasterize(&sample_grid()).unwrap();
        let inverted = Grid::from_rows(vec![vec![255, 128, 0], vec![0, 128, 255]]).unwrap();

        rasterizer.rasterize_into(&inverted, &mut image).unwrap();
        assert_eq!(image.as_raw(), rasterizer.rasterize(&inverted).unwrap().as_raw());
    }

    #[test]
    fn rasterize_into_rejects_wrong_buffer_size() {
        let rasterizer = Rasterizer::new(2).unwrap();
        let mut image = RgbImage::from_pixel(4, 4, Rgb([9, 9, 9]));

        let err = rasterizer.rasterize_into(&sample_grid(), &mut image).unwrap_err();
        assert!(matches!(
            err,
            MapViewError::DimensionMismatch {
                expected_width: 4,
                expected_height: 4,
                found_width: 6,
                found_height: 4
            }
        ));
        assert!(image.pixels().all(|pixel| *pixel == Rgb([9, 9, 9])));
    }

    #[test]
    fn oversized_image_is_rejected() {
        let wide = Grid::from_rows(vec![vec![0; 1000]]).unwrap();
        let err = Rasterizer::new(100_000).unwrap().rasterize(&wide).unwrap_err();
        assert!(matches!(
            err,
            MapViewError::ImageTooLarge {
                width: 1000,
                height: 1,
                scale: 100_000
            }
        ));

        let overflow = Rasterizer::new(u32::MAX).unwrap();
        assert!(overflow.image_size(&Grid::from_rows(vec![vec![1, 2]]).unwrap()).is_err());
    }

    #[test]
    fn largest_accepted_side_fits_exactly() {
        let grid = Grid::from_rows(vec![vec![0, 0]]).unwrap();
        let rasterizer = Rasterizer::new(MAX_IMAGE_SIDE / 2).unwrap();
        assert_eq!(rasterizer.image_size(&grid).unwrap(), (MAX_IMAGE_SIDE, MAX_IMAGE_SIDE / 2));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        assert_eq!(intensity(-5), 0);
        assert_eq!(intensity(0), 0);
        assert_eq!(intensity(200), 200);
        assert_eq!(intensity(255), 255);
        assert_eq!(intensity(1000), 255);
    }
}
