//! PNG output of rendered frames.

use std::io::Cursor;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ScreenshotError {
    #[error("frame of {width}x{height} needs {expected} bytes, got {actual}")]
    Size {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("failed to encode PNG: {0}")]
    Encode(#[from] png::EncodingError),

    #[error("failed to write screenshot {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Encode tightly packed RGBA8 pixels as a PNG image.
pub fn encode_png(width: u32, height: u32, pixels: &[u8]) -> Result<Vec<u8>, ScreenshotError> {
    let expected = width as usize * height as usize * 4;
    if pixels.len() != expected {
        return Err(ScreenshotError::Size {
            width,
            height,
            expected,
            actual: pixels.len(),
        });
    }

    let mut png_buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(Cursor::new(&mut png_buf), width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(pixels)?;
    }
    Ok(png_buf)
}

/// Encode and write a frame to `path`, creating parent directories.
pub fn save_png(path: &Path, width: u32, height: u32, pixels: &[u8]) -> Result<(), ScreenshotError> {
    let png = encode_png(width, height, pixels)?;
    let write_error = |source| ScreenshotError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }
    std::fs::write(path, png).map_err(write_error)
}
