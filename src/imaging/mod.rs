//! Image re-encoding for post uploads.
//!
//! Every image goes through decode → resize (Lanczos3) → transparency scan →
//! re-encode. Opaque images become JPEG at the lossy quality; images with any
//! transparent pixel stay PNG at the lossless quality. Batches run on the rayon
//! pool and each image succeeds or fails on its own.

pub mod calculations;
pub mod report;

pub use calculations::{fit_within, Dimensions};

use crate::config::ImageConfig;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::DynamicImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("{name} is not a recognized image file")]
    NotAnImage { name: String },
    #[error("{name} is {size} bytes, exceeding the {limit} byte limit")]
    TooLarge { name: String, size: u64, limit: u64 },
    #[error("failed to decode {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },
    #[error("max_dimension must be at least 1 pixel")]
    ZeroDimension,
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to encode {name}: {source}")]
    Encode {
        name: String,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to read {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn from_mime(name: &str) -> Result<Self, ImageError> {
        match name.trim().to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "image/png" | "png" => Ok(OutputFormat::Png),
            _ => Err(ImageError::UnsupportedFormat(name.to_string())),
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }
}

/// An undecoded input image.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = fs::read(path).map_err(|source| ImageError::Io {
            name: name.clone(),
            source,
        })?;
        Ok(Self { name, bytes })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformPlan {
    pub source: Dimensions,
    pub target: Dimensions,
    pub max_dimension: u32,
    pub format: OutputFormat,
    pub quality: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizedImage {
    pub name: String,
    pub original_size: u64,
    pub optimized_size: u64,
    pub plan: TransformPlan,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl OptimizedImage {
    pub fn width(&self) -> u32 {
        self.plan.target.width
    }

    pub fn height(&self) -> u32 {
        self.plan.target.height
    }

    pub fn savings_percent(&self) -> i64 {
        report::savings_percent(self.original_size, self.optimized_size)
    }

    pub fn data_url(&self) -> String {
        report::data_url(self.plan.format.mime(), &self.bytes)
    }

    pub fn markdown(&self) -> String {
        report::markdown_image(&self.name, &self.data_url())
    }
}

pub struct ImageOptimizer {
    config: ImageConfig,
    forced_format: Option<OutputFormat>,
}

impl Default for ImageOptimizer {
    fn default() -> Self {
        Self {
            config: ImageConfig::default(),
            forced_format: None,
        }
    }
}

impl ImageOptimizer {
    pub fn new(config: ImageConfig) -> Result<Self, ImageError> {
        if config.max_dimension == 0 {
            return Err(ImageError::ZeroDimension);
        }
        let forced_format = config
            .output_format
            .as_deref()
            .map(OutputFormat::from_mime)
            .transpose()?;
        Ok(Self {
            config,
            forced_format,
        })
    }

    pub fn max_dimension(&self) -> u32 {
        self.config.max_dimension
    }

    pub fn optimize(&self, source: &SourceImage) -> Result<OptimizedImage, ImageError> {
        let original_size = source.bytes.len() as u64;
        if original_size > self.config.max_file_size {
            return Err(ImageError::TooLarge {
                name: source.name.clone(),
                size: original_size,
                limit: self.config.max_file_size,
            });
        }

        let decoded = decode(source)?;
        let source_dims = Dimensions::new(decoded.width(), decoded.height());
        let target = fit_within(source_dims, self.config.max_dimension);

        let resized = if target == source_dims {
            decoded
        } else {
            decoded.resize_exact(target.width, target.height, FilterType::Lanczos3)
        };

        let transparent = has_transparency(&resized);
        let format = self.forced_format.unwrap_or(if transparent {
            OutputFormat::Png
        } else {
            OutputFormat::Jpeg
        });
        let quality = match format {
            OutputFormat::Jpeg => self.config.lossy_quality,
            OutputFormat::Png => self.config.lossless_quality,
        };

        let bytes = encode(&resized, format, quality).map_err(|e| match e {
            ImageError::Encode { source: err, .. } => ImageError::Encode {
                name: source.name.clone(),
                source: err,
            },
            other => other,
        })?;

        log::debug!(
            "{}: {}x{} -> {}x{} as {} (q={:.2}, {} -> {} bytes)",
            source.name,
            source_dims.width,
            source_dims.height,
            target.width,
            target.height,
            format.mime(),
            quality,
            original_size,
            bytes.len()
        );

        Ok(OptimizedImage {
            name: source.name.clone(),
            original_size,
            optimized_size: bytes.len() as u64,
            plan: TransformPlan {
                source: source_dims,
                target,
                max_dimension: self.config.max_dimension,
                format,
                quality,
            },
            bytes,
        })
    }

    /// Optimizes every image in parallel. Results line up with `sources` by index.
    pub fn optimize_batch(&self, sources: &[SourceImage]) -> Vec<Result<OptimizedImage, ImageError>> {
        let results: Vec<_> = sources.par_iter().map(|s| self.optimize(s)).collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        for error in results.iter().filter_map(|r| r.as_ref().err()) {
            log::warn!("Image optimization failed: {error}");
        }
        log::info!(
            "Optimized {} of {} images",
            results.len() - failed,
            results.len()
        );

        results
    }
}

fn decode(source: &SourceImage) -> Result<DynamicImage, ImageError> {
    let format = image::guess_format(&source.bytes).map_err(|_| ImageError::NotAnImage {
        name: source.name.clone(),
    })?;
    image::load_from_memory_with_format(&source.bytes, format).map_err(|e| ImageError::Decode {
        name: source.name.clone(),
        source: e,
    })
}

/// True when any pixel is less than fully opaque. Images without an alpha
/// channel are always opaque.
pub fn has_transparency(image: &DynamicImage) -> bool {
    if !image.color().has_alpha() {
        return false;
    }
    image.to_rgba8().pixels().any(|pixel| pixel.0[3] < u8::MAX)
}

/// Encodes `image` as `format`. Quality runs from 0.0 to 1.0; for PNG it picks the
/// compression effort.
pub fn encode(image: &DynamicImage, format: OutputFormat, quality: f32) -> Result<Vec<u8>, ImageError> {
    let mut buffer = Vec::new();
    let result = match format {
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality(quality));
            image.to_rgb8().write_with_encoder(encoder)
        }
        OutputFormat::Png => {
            let encoder =
                PngEncoder::new_with_quality(&mut buffer, png_compression(quality), PngFilter::Adaptive);
            image.to_rgba8().write_with_encoder(encoder)
        }
    };

    result.map_err(|source| ImageError::Encode {
        name: format.mime().to_string(),
        source,
    })?;
    Ok(buffer)
}

/// Encodes into a format named by MIME type or extension.
pub fn encode_as(image: &DynamicImage, format_name: &str, quality: f32) -> Result<Vec<u8>, ImageError> {
    encode(image, OutputFormat::from_mime(format_name)?, quality)
}

fn jpeg_quality(quality: f32) -> u8 {
    (quality.clamp(0.01, 1.0) * 100.0).round() as u8
}

fn png_compression(quality: f32) -> CompressionType {
    if quality >= 0.9 {
        CompressionType::Best
    } else if quality >= 0.5 {
        CompressionType::Default
    } else {
        CompressionType::Fast
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(image: DynamicImage) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        image.write_to(&mut cursor, ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    fn opaque_png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
        png_bytes(DynamicImage::ImageRgb8(image))
    }

    fn rgba_png(width: u32, height: u32, transparent_pixel: bool) -> Vec<u8> {
        let mut image = RgbaImage::from_pixel(width, height, Rgba([10, 200, 30, 255]));
        if transparent_pixel {
            image.put_pixel(width - 1, height - 1, Rgba([0, 0, 0, 0]));
        }
        png_bytes(DynamicImage::ImageRgba8(image))
    }

    fn optimizer(max_dimension: u32) -> ImageOptimizer {
        ImageOptimizer::new(ImageConfig {
            max_dimension,
            ..ImageConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_oversized_image_is_downscaled_to_jpeg() {
        let source = SourceImage::new("wide.png", opaque_png(240, 120));
        let result = optimizer(120).optimize(&source).unwrap();

        assert_eq!((result.width(), result.height()), (120, 60));
        assert_eq!(result.plan.source, Dimensions::new(240, 120));
        assert_eq!(result.plan.format, OutputFormat::Jpeg);
        assert_eq!(result.plan.quality, 0.8);
        assert_eq!(result.optimized_size, result.bytes.len() as u64);

        let reloaded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (120, 60));
        assert_eq!(image::guess_format(&result.bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_small_image_keeps_dimensions() {
        let source = SourceImage::new("small.png", opaque_png(64, 48));
        let result = ImageOptimizer::default().optimize(&source).unwrap();
        assert_eq!(result.plan.target, Dimensions::new(64, 48));
        assert_eq!(result.plan.max_dimension, 1200);
    }

    #[test]
    fn test_transparent_image_stays_png() {
        let source = SourceImage::new("logo.png", rgba_png(32, 32, true));
        let result = ImageOptimizer::default().optimize(&source).unwrap();
        assert_eq!(result.plan.format, OutputFormat::Png);
        assert_eq!(result.plan.quality, 0.9);
        assert!(result.data_url().starts_with("data:image/png;base64,"));
        assert!(result.markdown().starts_with("![logo.png](data:image/png;base64,"));
    }

    #[test]
    fn test_fully_opaque_rgba_becomes_jpeg() {
        let source = SourceImage::new("flat.png", rgba_png(32, 32, false));
        let result = ImageOptimizer::default().optimize(&source).unwrap();
        assert_eq!(result.plan.format, OutputFormat::Jpeg);
    }

    #[test]
    fn test_transparency_scan() {
        let opaque = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        assert!(!has_transparency(&opaque));
        let mut rgba = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));
        assert!(!has_transparency(&DynamicImage::ImageRgba8(rgba.clone())));
        rgba.put_pixel(0, 3, Rgba([1, 2, 3, 254]));
        assert!(has_transparency(&DynamicImage::ImageRgba8(rgba)));
    }

    #[test]
    fn test_forced_output_format() {
        let optimizer = ImageOptimizer::new(ImageConfig {
            output_format: Some("image/png".to_string()),
            ..ImageConfig::default()
        })
        .unwrap();
        let result = optimizer
            .optimize(&SourceImage::new("photo.png", opaque_png(16, 16)))
            .unwrap();
        assert_eq!(result.plan.format, OutputFormat::Png);
    }

    #[test]
    fn test_unknown_output_format_is_rejected() {
        let err = ImageOptimizer::new(ImageConfig {
            output_format: Some("image/tiff".to_string()),
            ..ImageConfig::default()
        })
        .err()
        .unwrap();
        assert!(matches!(err, ImageError::UnsupportedFormat(ref f) if f == "image/tiff"));

        let image = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        assert!(matches!(
            encode_as(&image, "image/bmp", 0.8),
            Err(ImageError::UnsupportedFormat(_))
        ));
        assert!(encode_as(&image, "jpg", 0.8).is_ok());
    }

    #[test]
    fn test_zero_max_dimension_is_rejected() {
        let result = ImageOptimizer::new(ImageConfig {
            max_dimension: 0,
            ..ImageConfig::default()
        });
        assert!(matches!(result, Err(ImageError::ZeroDimension)));
    }

    #[test]
    fn test_not_an_image() {
        let err = ImageOptimizer::default()
            .optimize(&SourceImage::new("notes.txt", b"just some text".to_vec()))
            .unwrap_err();
        assert!(matches!(err, ImageError::NotAnImage { ref name } if name == "notes.txt"));
    }

    #[test]
    fn test_truncated_image_fails_to_decode() {
        let mut bytes = opaque_png(16, 16);
        bytes.truncate(40);
        let err = ImageOptimizer::default()
            .optimize(&SourceImage::new("broken.png", bytes))
            .unwrap_err();
        assert!(matches!(err, ImageError::Decode { .. }), "got {err}");
    }

    #[test]
    fn test_file_size_limit() {
        let optimizer = ImageOptimizer::new(ImageConfig {
            max_file_size: 10,
            ..ImageConfig::default()
        })
        .unwrap();
        let err = optimizer
            .optimize(&SourceImage::new("big.png", opaque_png(8, 8)))
            .unwrap_err();
        assert!(matches!(err, ImageError::TooLarge { limit: 10, .. }));
    }

    #[test]
    fn test_batch_isolates_failures_and_keeps_order() {
        let sources = vec![
            SourceImage::new("a.png", opaque_png(30, 10)),
            SourceImage::new("bad.png", b"garbage".to_vec()),
            SourceImage::new("c.png", rgba_png(10, 30, true)),
        ];
        let results = optimizer(15).optimize_batch(&sources);

        assert_eq!(results.len(), 3);
        let first = results[0].as_ref().unwrap();
        assert_eq!(first.name, "a.png");
        assert_eq!(first.plan.target, Dimensions::new(15, 5));
        assert!(results[1].is_err());
        let third = results[2].as_ref().unwrap();
        assert_eq!(third.name, "c.png");
        assert_eq!(third.plan.target, Dimensions::new(5, 15));
    }

    #[test]
    fn test_quality_mapping() {
        assert_eq!(jpeg_quality(0.8), 80);
        assert_eq!(jpeg_quality(0.0), 1);
        assert_eq!(jpeg_quality(2.0), 100);
        assert!(matches!(png_compression(0.9), CompressionType::Best));
    }
}
