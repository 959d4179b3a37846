use std::path::PathBuf;
use std::time::Duration;

use super::error::{MapViewError, Result};

pub const DEFAULT_FILE_PATH: &str = "maps/map.csv";
pub const DEFAULT_SCALE: u32 = 2;
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 1000;
pub const MAX_REFRESH_INTERVAL_MS: u64 = 24 * 60 * 60 * 1000;

const USAGE: &str = "usage: mapview [FILE] [--scale N] [--interval MS] [--strict]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerConfig {
    pub file_path: PathBuf,
    pub scale: u32,
    pub refresh_interval_ms: u64,
    // stop the viewer on the first failed refresh instead of skipping the tick
    pub strict: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            file_path: PathBuf::from(DEFAULT_FILE_PATH),
            scale: DEFAULT_SCALE,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            strict: false,
        }
    }
}

impl ViewerConfig {
    /// Parses command line arguments, not including the program name.
    pub fn from_args<I, S>(args: I) -> Result<ViewerConfig>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = ViewerConfig::default();
        let mut file_path: Option<PathBuf> = None;
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--scale" | "-s" => {
                    config.scale = parse_value(&arg, args.next())?;
                    if config.scale == 0 {
                        return Err(MapViewError::InvalidArgument(
                            "--scale must be at least 1".to_string(),
                        ));
                    }
                }
                "--interval" | "-i" => {
                    config.refresh_interval_ms = parse_value(&arg, args.next())?;
                    if !(1..=MAX_REFRESH_INTERVAL_MS).contains(&config.refresh_interval_ms) {
                        return Err(MapViewError::InvalidArgument(format!(
                            "--interval must be between 1 and {MAX_REFRESH_INTERVAL_MS} milliseconds"
                        )));
                    }
                }
                "--strict" => config.strict = true,
                flag if flag.starts_with('-') => {
                    return Err(MapViewError::InvalidArgument(format!(
                        "unknown option {flag}\n{USAGE}"
                    )));
                }
                path => {
                    if file_path.is_some() {
                        return Err(MapViewError::InvalidArgument(format!(
                            "more than one map file given\n{USAGE}"
                        )));
                    }
                    file_path = Some(PathBuf::from(path));
                }
            }
        }

        if let Some(file_path) = file_path {
            config.file_path = file_path;
        }
        Ok(config)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T> {
    match value {
        Some(value) => value.parse::<T>().map_err(|_| {
            MapViewError::InvalidArgument(format!("{flag} expects a number, got {value:?}"))
        }),
        None => Err(MapViewError::InvalidArgument(format!(
            "{flag} expects a value\n{USAGE}"
        ))),
    }
}
