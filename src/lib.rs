// Image Marker Library
// Watermark layout, compositing and persistence for background images

pub mod config;
pub mod error;
pub mod logging;
pub mod watermark;
