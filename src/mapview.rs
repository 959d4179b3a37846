pub mod config;
pub mod display;
pub mod error;
pub mod grid;
pub mod raster;
pub mod scheduler;
pub mod window;

use std::time::Instant;

use log::info;
use speedy2d::window::{WindowCreationOptions, WindowPosition, WindowSize};
use speedy2d::Window;

use config::ViewerConfig;
use display::DisplaySurface;
use error::{MapViewError, Result};
use grid::Grid;
use raster::Rasterizer;
use scheduler::RefreshTick;
use window::MapViewWindowHandler;

/// Loads the first grid and builds the surface the window will be sized from.
pub fn open_surface(config: &ViewerConfig) -> Result<DisplaySurface> {
    let start_time = Instant::now();
    let rasterizer = Rasterizer::new(config.scale)?;
    let grid = Grid::load(&config.file_path)?;
    let surface = DisplaySurface::new(&grid, rasterizer)?;

    info!(
        "Loaded initial {}x{} grid from {:?} in {:?}",
        grid.width(),
        grid.height(),
        config.file_path,
        start_time.elapsed()
    );
    Ok(surface)
}

pub fn run_viewer(config: ViewerConfig) -> Result<()> {
    let surface = open_surface(&config)?;
    let options = WindowCreationOptions::new_windowed(
        WindowSize::PhysicalPixels(surface.size()),
        Some(WindowPosition::Center),
    );

    let handler = MapViewWindowHandler::new(
        config.file_path.clone(),
        surface,
        config.refresh_interval(),
        config.strict,
    );

    let window = Window::<RefreshTick>::new_with_user_events(&handler.title(), options)
        .map_err(|err| MapViewError::Window(format!("{:?}", err)))?;
    window.run_loop(handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::fs;
    use std::path::PathBuf;

    fn temp_map(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("mapview-{}-{}.csv", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    fn config_for(path: PathBuf, scale: u32) -> ViewerConfig {
        ViewerConfig {
            file_path: path,
            scale,
            ..ViewerConfig::default()
        }
    }

    #[test]
    fn loads_file_into_expected_image() {
        let path = temp_map("scenario", "0,128,255\n255,128,0\n");
        let surface = open_surface(&config_for(path.clone(), 1)).unwrap();
        let image = surface.image();

        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(*image.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*image.get_pixel(1, 0), Rgb([128, 128, 128]));
        assert_eq!(*image.get_pixel(2, 0), Rgb([255, 255, 255]));
        assert_eq!(*image.get_pixel(0, 1), Rgb([255, 255, 255]));
        assert_eq!(*image.get_pixel(1, 1), Rgb([128, 128, 128]));
        assert_eq!(*image.get_pixel(2, 1), Rgb([0, 0, 0]));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn saved_grid_round_trips_through_file() {
        let grid = Grid::from_rows(vec![vec![5, 6, 7, 8], vec![9, 10, 11, 12], vec![0, 255, 1, 254]]).unwrap();
        let path = std::env::temp_dir().join(format!("mapview-{}-roundtrip.csv", std::process::id()));
        grid.save(&path).unwrap();

        assert_eq!(Grid::load(&path).unwrap(), grid);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn refresh_picks_up_rewritten_file() {
        let path = temp_map("rewrite", "0,0\n0,0\n");
        let mut surface = open_surface(&config_for(path.clone(), 2)).unwrap();

        fs::write(&path, "10,20\n30,40\n").unwrap();
        surface.replace(&Grid::load(&path).unwrap()).unwrap();

        assert_eq!(surface.revision(), 1);
        assert_eq!(*surface.image().get_pixel(3, 3), Rgb([40, 40, 40]));
        assert_eq!(*surface.image().get_pixel(2, 0), Rgb([20, 20, 20]));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn malformed_or_resized_file_keeps_last_image() {
        let path = temp_map("malformed", "1,2\n3,4\n");
        let mut surface = open_surface(&config_for(path.clone(), 1)).unwrap();
        let before = surface.image().clone();

        fs::write(&path, "a,b\nc,d\n").unwrap();
        assert!(matches!(Grid::load(&path), Err(MapViewError::InvalidCell { .. })));

        fs::write(&path, "1,2,3\n4,5,6\n").unwrap();
        let resized = Grid::load(&path).unwrap();
        assert!(matches!(
            surface.replace(&resized),
            Err(MapViewError::DimensionMismatch { .. })
        ));
        assert_eq!(surface.image().as_raw(), before.as_raw());
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn startup_fails_on_missing_file_or_zero_scale() {
        let missing = std::env::temp_dir().join("mapview-missing-startup.csv");
        assert!(matches!(
            open_surface(&config_for(missing, 2)),
            Err(MapViewError::Io(_))
        ));

        let path = temp_map("zero-scale", "1\n");
        assert!(matches!(
            open_surface(&config_for(path.clone(), 0)),
            Err(MapViewError::InvalidScale(0))
        ));
        fs::remove_file(path).unwrap();
    }
}
