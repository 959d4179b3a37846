use std::path::PathBuf;
use std::process::exit;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use speedy2d::color::Color;
use speedy2d::dimen::Vector2;
use speedy2d::image::{ImageDataType, ImageHandle, ImageSmoothingMode};
use speedy2d::window::{KeyScancode, VirtualKeyCode, WindowHandler, WindowHelper, WindowStartupInfo};
use speedy2d::Graphics2D;
use time::macros::format_description;
use time::OffsetDateTime;

use super::display::DisplaySurface;
use super::error::Result;
use super::grid::Grid;
use super::scheduler::{spawn_ticker, RefreshOutcome, RefreshScheduler, RefreshTick};

pub struct MapViewWindowHandler {
    file_path: PathBuf,
    surface: DisplaySurface,
    scheduler: RefreshScheduler,
    strict: bool,
    // texture of the surface, tagged with the revision it was uploaded from
    texture: Option<(u64, ImageHandle)>,
}

impl MapViewWindowHandler {
    pub fn new(
        file_path: PathBuf,
        surface: DisplaySurface,
        refresh_interval: Duration,
        strict: bool,
    ) -> MapViewWindowHandler {
        MapViewWindowHandler {
            file_path,
            surface,
            scheduler: RefreshScheduler::new(refresh_interval),
            strict,
            texture: None,
        }
    }

    pub fn title(&self) -> String {
        let file_name = self
            .file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_path.display().to_string());
        format!("mapview - {}", file_name)
    }

    fn refresh(&mut self) -> Result<()> {
        let grid = Grid::load(&self.file_path)?;
        self.surface.replace(&grid)
    }

    // one refresh tick; the scheduler must already be in Refreshing
    fn run_refresh(&mut self, helper: &mut WindowHelper<RefreshTick>) {
        let start_time = Instant::now();
        let result = self.refresh();
        let outcome = self.scheduler.complete_refresh(&result, self.strict, Instant::now());
        match result {
            Ok(()) => {
                debug!(
                    "Refreshed {:?} (revision {}) in {:?}",
                    self.file_path,
                    self.surface.revision(),
                    start_time.elapsed()
                );
                helper.set_title(&self.refreshed_title());
                helper.request_redraw();
            }
            Err(err) if outcome == RefreshOutcome::Stopped => {
                // run_loop never returns, so the exit code has to be set here
                error!("Refresh of {:?} failed, stopping: {}", self.file_path, err);
                exit(1);
            }
            Err(err) => {
                warn!("Refresh of {:?} failed, keeping last image: {}", self.file_path, err);
            }
        }
    }

    fn refreshed_title(&self) -> String {
        let format = format_description!("[hour]:[minute]:[second]");
        match OffsetDateTime::now_utc().format(format) {
            Ok(timestamp) => format!("{} (updated {} UTC)", self.title(), timestamp),
            Err(_) => self.title(),
        }
    }
}

impl WindowHandler<RefreshTick> for MapViewWindowHandler {
    fn on_start(&mut self, helper: &mut WindowHelper<RefreshTick>, info: WindowStartupInfo) {
        info!(
            "Viewing {:?}: grid {:?}, surface {:?}, viewport {:?}, scale_factor {}",
            self.file_path,
            self.surface.grid_dimensions(),
            self.surface.size(),
            info.viewport_size_pixels(),
            info.scale_factor()
        );

        if !self.scheduler.arm(Instant::now()) {
            return;
        }
        spawn_ticker(helper.create_user_event_sender(), self.scheduler.interval());
    }

    fn on_user_event(&mut self, helper: &mut WindowHelper<RefreshTick>, _user_event: RefreshTick) {
        if self.scheduler.begin_refresh(Instant::now()) {
            self.run_refresh(helper);
        } else {
            debug!("Dropped refresh tick in state {:?}", self.scheduler.state());
        }
    }

    fn on_key_up(
        &mut self,
        helper: &mut WindowHelper<RefreshTick>,
        virtual_key_code: Option<VirtualKeyCode>,
        _scancode: KeyScancode,
    ) {
        match virtual_key_code {
            Some(VirtualKeyCode::Q) | Some(VirtualKeyCode::Escape) => {
                info!("Closing viewer");
                self.scheduler.terminate();
                helper.terminate_loop();
            }
            Some(VirtualKeyCode::R) => {
                if self.scheduler.begin_forced_refresh(Instant::now()) {
                    self.run_refresh(helper);
                }
            }
            _ => (),
        }
    }

    fn on_draw(&mut self, _helper: &mut WindowHelper<RefreshTick>, graphics: &mut Graphics2D) {
        let revision = self.surface.revision();
        let stale = !matches!(&self.texture, Some((uploaded, _)) if *uploaded == revision);
        if stale {
            let image = self.surface.image();
            match graphics.create_image_from_raw_pixels(
                ImageDataType::RGB,
                ImageSmoothingMode::NearestNeighbor,
                Vector2::new(image.width(), image.height()),
                image.as_raw(),
            ) {
                Ok(handle) => self.texture = Some((revision, handle)),
                Err(err) => warn!("Failed to upload image: {:?}", err),
            }
        }

        graphics.clear_screen(Color::from_rgb(0.0, 0.0, 0.0));
        if let Some((_, handle)) = &self.texture {
            graphics.draw_image(Vector2::new(0.0, 0.0), handle);
        }
    }
}
