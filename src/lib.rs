pub mod batch;
#[cfg(feature = "camera-v4l2")]
pub mod camera;
pub mod cli;
pub mod config;
pub mod detector;
pub mod display;
pub mod frame_source;
pub mod narrator;
pub mod overlay;
pub mod pipeline;
pub mod progress;
pub mod region;
pub mod report;
pub mod session;
pub mod speech;
