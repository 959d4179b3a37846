mod mapview;

use std::process::exit;

use log::error;
use mapview::config::ViewerConfig;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match ViewerConfig::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            exit(1);
        }
    };

    if let Err(err) = mapview::run_viewer(config) {
        error!("{}", err);
        exit(1);
    }
}
