//! Baked raster side files.
//!
//! A raster file is the ASCII header `"<width> <height>"` followed directly by
//! the packed pixel bytes in native byte order. The header is not terminated,
//! so the reader uses the expected payload length to find where the height
//! digits stop.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bytemuck::{Pod, Zeroable};

/// RGBA8 surface colour raster.
pub type SurfaceRaster = Raster<[u8; 4]>;

/// Single-channel f32 normal-map blend raster.
pub type InterpolationRaster = Raster<f32>;

/// Longest decimal representation of a `u32`.
const MAX_DIMENSION_DIGITS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterOperation {
    Read,
    CreateDir,
    CreateTemp,
    Write,
    Persist,
}

impl fmt::Display for RasterOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::CreateDir => "create directory for",
            Self::CreateTemp => "create temporary file for",
            Self::Write => "write",
            Self::Persist => "persist",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("failed to {operation} raster {}: {source}", path.display())]
    Io {
        path: PathBuf,
        operation: RasterOperation,
        #[source]
        source: io::Error,
    },

    #[error("raster {} has a malformed header: {reason}", path.display())]
    Header { path: PathBuf, reason: String },

    #[error("raster has {actual} pixels but {width}x{height} needs {expected}")]
    PixelCount {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Width × height grid of `T` stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster<T> {
    width: u32,
    height: u32,
    pixels: Vec<T>,
}

impl<T: Pod> Raster<T> {
    pub fn new(width: u32, height: u32, pixels: Vec<T>) -> Result<Self, RasterError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected || expected == 0 {
            return Err(RasterError::PixelCount {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build a raster by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> T) -> Self {
        let pixels = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Read a raster file written by [`Raster::write`].
    pub fn read(path: &Path) -> Result<Self, RasterError> {
        let bytes = fs::read(path).map_err(|source| RasterError::Io {
            path: path.to_path_buf(),
            operation: RasterOperation::Read,
            source,
        })?;
        let (width, height, payload) =
            split_header(&bytes, size_of::<T>()).map_err(|reason| RasterError::Header {
                path: path.to_path_buf(),
                reason,
            })?;
        let mut pixels = vec![T::zeroed(); payload.len() / size_of::<T>()];
        bytemuck::cast_slice_mut::<T, u8>(&mut pixels).copy_from_slice(payload);
        Self::new(width, height, pixels)
    }

    /// Write the raster next to `path` and atomically rename it into place,
    /// so a failed write never leaves a truncated file behind.
    pub fn write(&self, path: &Path) -> Result<(), RasterError> {
        let io_err = |operation| {
            let path = path.to_path_buf();
            move |source| RasterError::Io {
                path,
                operation,
                source,
            }
        };

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_err(RasterOperation::CreateDir))?;

        let mut file =
            tempfile::NamedTempFile::new_in(dir).map_err(io_err(RasterOperation::CreateTemp))?;
        write!(file, "{} {}", self.width, self.height)
            .and_then(|()| file.write_all(self.as_bytes()))
            .and_then(|()| file.as_file().sync_all())
            .map_err(io_err(RasterOperation::Write))?;
        file.persist(path)
            .map_err(|e| io_err(RasterOperation::Persist)(e.error))?;
        Ok(())
    }
}

/// Split `"<w> <h>"` from the payload. The height is the digit prefix whose
/// length leaves exactly `w * h * pixel_size` bytes.
fn split_header(bytes: &[u8], pixel_size: usize) -> Result<(u32, u32, &[u8]), String> {
    let width_len = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if width_len == 0 {
        return Err("missing width".into());
    }
    if bytes.get(width_len) != Some(&b' ') {
        return Err("expected a single space after the width".into());
    }
    let width = parse_dimension(&bytes[..width_len])?;

    let rest = &bytes[width_len + 1..];
    let digits = rest
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count()
        .min(MAX_DIMENSION_DIGITS);
    if digits == 0 {
        return Err("missing height".into());
    }

    for len in 1..=digits {
        let Ok(height) = parse_dimension(&rest[..len]) else {
            continue;
        };
        let payload = &rest[len..];
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(pixel_size));
        if width > 0 && height > 0 && expected == Some(payload.len()) {
            return Ok((width, height, payload));
        }
    }
    Err(format!(
        "no height matches the {} payload bytes for width {width}",
        rest.len()
    ))
}

fn parse_dimension(digits: &[u8]) -> Result<u32, String> {
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| format!("'{}' is not a valid dimension", String::from_utf8_lossy(digits)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_surface_raster_survives_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("SurfaceTexture.raw");
        let raster = SurfaceRaster::from_fn(5, 3, |x, y| [x as u8, y as u8, 7, 255]);
        raster.write(&path).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"5 3"));
        assert_eq!(bytes.len(), 3 + 5 * 3 * 4);

        assert_eq!(SurfaceRaster::read(&path).unwrap(), raster);
    }

    #[test]
    fn test_interpolation_raster_survives_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/NormalInterpolation.raw");
        let raster = InterpolationRaster::from_fn(4, 4, |x, y| x as f32 * 0.25 - y as f32);
        raster.write(&path).unwrap();
        assert_eq!(InterpolationRaster::read(&path).unwrap(), raster);
    }

    #[test]
    fn test_payload_starting_with_digit_bytes() {
        // A grey value of b'7' directly after the height digits.
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("digits.raw");
        let raster = SurfaceRaster::from_fn(2, 1, |_, _| [b'7', b'1', b'0', b'9']);
        raster.write(&path).unwrap();
        let back = SurfaceRaster::read(&path).unwrap();
        assert_eq!((back.width(), back.height()), (2, 1));
        assert_eq!(back, raster);
    }

    #[test]
    fn test_missing_file_reports_path_and_operation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.raw");
        let err = SurfaceRaster::read(&path).unwrap_err();
        match &err {
            RasterError::Io {
                path: p, operation, ..
            } => {
                assert_eq!(p, &path);
                assert_eq!(*operation, RasterOperation::Read);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.to_string().contains("absent.raw"));
    }

    #[test]
    fn test_bad_headers_are_rejected() {
        let cases: [&[u8]; 5] = [b"", b"x 1 ", b"12", b"2 ", b"2 1abc"];
        for case in cases {
            assert!(split_header(case, 4).is_err(), "{case:?} parsed");
        }
    }

    #[test]
    fn test_truncated_payload_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.raw");
        fs::write(&path, b"2 2\x00\x00\x00").unwrap();
        assert!(matches!(
            SurfaceRaster::read(&path),
            Err(RasterError::Header { .. })
        ));
    }

    #[test]
    fn test_failed_write_leaves_previous_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keep.raw");
        let raster = SurfaceRaster::from_fn(1, 1, |_, _| [1, 2, 3, 4]);
        raster.write(&path).unwrap();

        // A directory cannot be replaced by the rename.
        let blocked = dir.path().join("blocked");
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("child"), b"x").unwrap();
        assert!(raster.write(&blocked).is_err());
        assert!(blocked.is_dir());

        assert_eq!(SurfaceRaster::read(&path).unwrap(), raster);
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 2);
    }

    #[test]
    fn test_pixel_count_must_match() {
        assert!(matches!(
            SurfaceRaster::new(2, 2, vec![[0; 4]; 3]),
            Err(RasterError::PixelCount { expected: 4, actual: 3, .. })
        ));
        assert!(SurfaceRaster::new(0, 0, Vec::new()).is_err());
    }
}
