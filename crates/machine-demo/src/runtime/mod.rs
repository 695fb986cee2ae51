mod app;
mod config;
mod logging;
mod playback;
mod telemetry;

pub use app::run_from_args;
