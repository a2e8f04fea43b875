// Shared fixtures for end-to-end mark tests
//
// Each harness owns a temp directory with an `assets/` tree and an `output/`
// directory; both are removed when the harness is dropped.

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use image_marker::config::MarkerConfig;
use image_marker::watermark::ImageMarker;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct MarkerTestHarness {
    dir: TempDir,
    pub marker: ImageMarker,
}

impl MarkerTestHarness {
    /// Harness with a 400x300 white `assets/bg.png`, a 40x20 red
    /// `assets/logo.png` and a 10x10 blue `assets/badge.png`, margin 10.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(customize: impl FnOnce(&mut MarkerConfig)) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let assets = dir.path().join("assets");
        std::fs::create_dir_all(&assets).expect("Failed to create assets dir");

        std::fs::write(assets.join("bg.png"), solid_png(400, 300, [255, 255, 255, 255]))
            .expect("Failed to write background");
        std::fs::write(assets.join("logo.png"), solid_png(40, 20, [255, 0, 0, 255]))
            .expect("Failed to write logo");
        std::fs::write(assets.join("badge.png"), solid_png(10, 10, [0, 0, 255, 255]))
            .expect("Failed to write badge");

        let mut config = MarkerConfig {
            output_dir: dir.path().join("output"),
            assets_dir: assets,
            margin: 10.0,
            ..Default::default()
        };
        customize(&mut config);

        let marker = ImageMarker::from_config(config).expect("Failed to create marker");
        Self { dir, marker }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("output")
    }

    /// Files currently in the output directory.
    pub fn output_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(self.output_dir()) {
            Ok(entries) => {
                let mut files: Vec<PathBuf> =
                    entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
                files.sort();
                files
            }
            Err(_) => Vec::new(),
        }
    }
}

pub fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut buffer, ImageFormat::Png)
        .expect("Failed to encode png");
    buffer.into_inner()
}

pub fn open_rgba(path: &Path) -> RgbaImage {
    image::open(path).expect("Failed to open output").to_rgba8()
}
