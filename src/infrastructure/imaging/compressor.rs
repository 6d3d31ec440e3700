use std::io::Cursor;

use futures::future::join_all;
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, GenericImageView, ImageError};
use tracing::{debug, instrument, warn};

use crate::{
    entities::upload::{CompressedImage, ImageFile},
    settings::AppConfig,
    utils::file_name::with_extension,
};

const OUTPUT_CONTENT_TYPE: &str = "image/jpeg";
const OUTPUT_EXTENSION: &str = "jpg";

/// Downsamples to a bounded width and re-encodes as JPEG.
///
/// Decoding or encoding failures never surface: the caller gets the original file back.
#[derive(Debug, Clone, Copy)]
pub struct ImageCompressor {
    pub max_width: u32,
    pub quality: u8,
}

impl ImageCompressor {
    pub fn new(max_width: u32, quality: u8) -> Self {
        ImageCompressor {
            max_width: max_width.max(1),
            quality: quality.clamp(1, 100),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.max_image_width, config.jpeg_quality())
    }

    /// Clamps the width to `max_width` keeping the aspect ratio. Never upscales.
    pub fn target_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
        if width <= max_width || width == 0 {
            return (width, height);
        }

        let scaled_height = (height as u64 * max_width as u64 + width as u64 / 2) / width as u64;
        (max_width, (scaled_height as u32).max(1))
    }

    #[instrument(skip_all, fields(file = %file.file_name, size = file.size()))]
    pub fn compress(&self, file: ImageFile) -> CompressedImage {
        match self.encode(&file) {
            Ok((bytes, dimensions)) => {
                debug!(
                    original = file.size(),
                    compressed = bytes.len(),
                    width = dimensions.0,
                    height = dimensions.1,
                    "Image compressed"
                );
                CompressedImage {
                    original_name: file.file_name.clone(),
                    file: ImageFile {
                        file_name: with_extension(&file.file_name, OUTPUT_EXTENSION),
                        content_type: OUTPUT_CONTENT_TYPE.to_string(),
                        bytes,
                    },
                    dimensions: Some(dimensions),
                    compressed: true,
                }
            }
            Err(e) => {
                warn!(error = %e, "Compression failed, uploading original file");
                CompressedImage::passthrough(file)
            }
        }
    }

    fn encode(&self, file: &ImageFile) -> Result<(Vec<u8>, (u32, u32)), ImageError> {
        let img = image::load_from_memory(&file.bytes)?;
        let (width, height) = img.dimensions();
        let (target_width, target_height) = Self::target_dimensions(width, height, self.max_width);

        let img = if (target_width, target_height) == (width, height) {
            img
        } else {
            img.resize_exact(target_width, target_height, FilterType::Triangle)
        };

        let rgb = img.to_rgb8();
        let mut buffer = Cursor::new(Vec::new());
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality);
        encoder.encode_image(&rgb)?;

        Ok((buffer.into_inner(), (target_width, target_height)))
    }

    /// Compresses every file off the async runtime. Output order matches input order.
    pub async fn compress_all(&self, files: Vec<ImageFile>) -> Vec<CompressedImage> {
        let compressor = *self;

        let jobs = files.into_iter().map(|file| async move {
            let fallback = file.clone();
            tokio::task::spawn_blocking(move || compressor.compress(file))
                .await
                .unwrap_or_else(|e| {
                    warn!(error = %e, file = %fallback.file_name, "Compression task aborted");
                    CompressedImage::passthrough(fallback)
                })
        });

        join_all(jobs).await
    }
}
