//! Size-bounded JPEG re-encoding for oversized images.

use image::RgbImage;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::timeout;

use crate::config::{CompressionConfig, LimitsConfig};
use crate::error::StageError;
use crate::types::Stage;

/// Suffix appended to the original path for the derived artifact.
const DERIVED_SUFFIX: &str = ".compressed.jpg";

/// Quality decrement between re-encode attempts.
const QUALITY_STEP: u8 = 5;

/// Output of the compress stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedFile {
    /// Path to upload from: the original, or the derived JPEG
    pub path: PathBuf,

    /// True iff a temp file was written. The task runner owns deleting it.
    pub derived: bool,
}

/// Shrinks oversized images below a byte threshold by JPEG re-encoding.
pub struct Compressor {
    config: CompressionConfig,
    timeout_ms: u64,
}

impl Compressor {
    /// Create a new compressor with the given settings and time budget.
    pub fn new(config: CompressionConfig, limits: &LimitsConfig) -> Self {
        Self {
            config,
            timeout_ms: limits.compress_timeout_ms,
        }
    }

    /// Ensure the file at `path` fits the size bound.
    ///
    /// Files already at or under the bound pass through untouched; no temp
    /// file is created. Oversized files are decoded once and re-encoded as
    /// JPEG at stepwise-lower quality until the buffer fits or quality hits
    /// the floor, then persisted next to the original. Any failure here is
    /// fatal to the task; the remote stages never see this image.
    pub async fn shrink(&self, path: &Path) -> Result<CompressedFile, StageError> {
        let metadata =
            tokio::fs::metadata(path)
                .await
                .map_err(|e| StageError::Decode {
                    path: path.to_path_buf(),
                    message: format!("cannot read file metadata: {e}"),
                })?;
        if metadata.len() <= self.config.max_bytes {
            return Ok(CompressedFile {
                path: path.to_path_buf(),
                derived: false,
            });
        }

        let config = self.config.clone();
        let path_owned = path.to_path_buf();
        let shrink_result = timeout(Duration::from_millis(self.timeout_ms), async {
            tokio::task::spawn_blocking(move || shrink_sync(&config, &path_owned)).await
        })
        .await;

        match shrink_result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => Err(StageError::Decode {
                path: path.to_path_buf(),
                message: format!("task join error: {e}"),
            }),
            Err(_) => Err(StageError::Timeout {
                stage: Stage::Compress,
                timeout_ms: self.timeout_ms,
            }),
        }
    }
}

/// Synchronous decode + re-encode loop (runs in spawn_blocking).
fn shrink_sync(config: &CompressionConfig, path: &Path) -> Result<CompressedFile, StageError> {
    let image = image::ImageReader::open(path)
        .map_err(|e| StageError::Decode {
            path: path.to_path_buf(),
            message: format!("cannot open image: {e}"),
        })?
        .decode()
        .map_err(|e| StageError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    // JPEG has no alpha channel; flatten anything that carries one.
    let rgb: RgbImage = match image {
        image::DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.to_rgb8(),
    };

    let mut quality = config.start_quality;
    let mut buffer = encode_jpeg(&rgb, quality, path)?;
    // Re-encode from the decoded pixels each pass, never from the previous
    // JPEG buffer, so artifacts don't compound.
    while buffer.len() as u64 > config.max_bytes && quality > config.min_quality {
        quality = quality.saturating_sub(QUALITY_STEP).max(config.min_quality);
        buffer = encode_jpeg(&rgb, quality, path)?;
    }

    if buffer.len() as u64 > config.max_bytes {
        tracing::debug!(
            "{} still {} bytes at quality floor {}",
            path.display(),
            buffer.len(),
            quality
        );
    }

    let derived = derived_path(path);
    std::fs::write(&derived, &buffer).map_err(|e| StageError::Filesystem {
        stage: Stage::Compress,
        path: derived.clone(),
        message: e.to_string(),
    })?;

    Ok(CompressedFile {
        path: derived,
        derived: true,
    })
}

fn encode_jpeg(image: &RgbImage, quality: u8, path: &Path) -> Result<Vec<u8>, StageError> {
    let mut buffer = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
    image
        .write_with_encoder(encoder)
        .map_err(|e| StageError::Decode {
            path: path.to_path_buf(),
            message: format!("re-encode at quality {quality} failed: {e}"),
        })?;
    Ok(buffer.into_inner())
}

/// `photo.png` becomes `photo.png.compressed.jpg`.
fn derived_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(DERIVED_SUFFIX);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn test_compressor(max_bytes: u64) -> Compressor {
        let config = CompressionConfig {
            max_bytes,
            ..CompressionConfig::default()
        };
        Compressor::new(config, &LimitsConfig::default())
    }

    /// Random pixels defeat both PNG and JPEG compression, so small
    /// dimensions still produce files well over the test thresholds.
    fn write_noise_png(path: &Path, width: u32, height: u32) {
        let mut rng = StdRng::seed_from_u64(42);
        let img = image::RgbaImage::from_fn(width, height, |_, _| {
            image::Rgba([rng.gen(), rng.gen(), rng.gen(), 255])
        });
        img.save(path).unwrap();
    }

    #[tokio::test]
    async fn test_small_file_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.png");
        let img = image::RgbImage::from_pixel(8, 8, image::Rgb([120, 10, 200]));
        img.save(&path).unwrap();

        let out = test_compressor(256 * 1024).shrink(&path).await.unwrap();
        assert_eq!(out.path, path);
        assert!(!out.derived);
        assert!(!derived_path(&path).exists());
    }

    #[tokio::test]
    async fn test_oversized_file_shrinks_under_bound() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        write_noise_png(&path, 64, 64);
        assert!(std::fs::metadata(&path).unwrap().len() > 8 * 1024);

        let out = test_compressor(8 * 1024).shrink(&path).await.unwrap();
        assert!(out.derived);
        assert_eq!(out.path, derived_path(&path));
        assert!(std::fs::metadata(&out.path).unwrap().len() <= 8 * 1024);
        // The original is left alone.
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_quality_floor_still_produces_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dense.png");
        write_noise_png(&path, 64, 64);

        // 200 bytes is unreachable for 64x64 noise even at quality 10;
        // the loop must terminate at the floor and persist what it has.
        let out = test_compressor(200).shrink(&path).await.unwrap();
        assert!(out.derived);
        assert!(out.path.exists());
    }

    #[tokio::test]
    async fn test_alpha_input_flattens_to_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layered.png");
        let mut rng = StdRng::seed_from_u64(7);
        let img = image::RgbaImage::from_fn(64, 64, |_, _| {
            image::Rgba([rng.gen(), rng.gen(), rng.gen(), rng.gen()])
        });
        img.save(&path).unwrap();

        let out = test_compressor(1024).shrink(&path).await.unwrap();
        let reader = image::ImageReader::open(&out.path)
            .unwrap()
            .with_guessed_format()
            .unwrap();
        assert_eq!(reader.format(), Some(image::ImageFormat::Jpeg));
        assert!(reader.decode().is_ok());
    }

    #[tokio::test]
    async fn test_unreadable_source_is_fatal() {
        let err = test_compressor(1024)
            .shrink(Path::new("/no/such/image.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_undecodable_source_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.jpg");
        std::fs::write(&path, vec![0u8; 4096]).unwrap();

        let err = test_compressor(1024).shrink(&path).await.unwrap_err();
        assert!(matches!(err, StageError::Decode { .. }));
    }

    #[test]
    fn test_derived_path_suffix() {
        assert_eq!(
            derived_path(Path::new("/photos/shot.png")),
            PathBuf::from("/photos/shot.png.compressed.jpg")
        );
    }
}
