use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

pub const TRANSPORT_SIZE: u32 = 320;
const JPEG_QUALITY: u8 = 100;
const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportEncoding {
    /// Bare base64 of the JPEG bytes.
    #[default]
    Raw,
    /// `data:image/jpeg;base64,...`; the server strips the prefix.
    DataUrl,
}

pub fn encode_file(path: &Path, encoding: TransportEncoding) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    encode_bytes(&bytes, encoding).with_context(|| format!("failed to encode {}", path.display()))
}

pub fn encode_bytes(bytes: &[u8], encoding: TransportEncoding) -> Result<String> {
    let img = image::load_from_memory(bytes).context("failed to decode image")?;
    encode_image(&img, encoding)
}

/// Stretches `img` to 320x320 (aspect ratio is not kept) and base64s it as JPEG.
pub fn encode_image(img: &DynamicImage, encoding: TransportEncoding) -> Result<String> {
    let resized = img
        .resize_exact(TRANSPORT_SIZE, TRANSPORT_SIZE, FilterType::Triangle)
        .to_rgb8();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(&resized)
        .context("failed to encode jpeg")?;

    let encoded = STANDARD.encode(&jpeg);
    Ok(match encoding {
        TransportEncoding::Raw => encoded,
        TransportEncoding::DataUrl => format!("{DATA_URL_PREFIX}{encoded}"),
    })
}

/// Inverse of [`encode_image`]'s framing: returns the JPEG bytes.
pub fn decode_transport(encoded: &str) -> Result<Vec<u8>> {
    let payload = encoded
        .split_once(',')
        .map(|(_, rest)| rest)
        .unwrap_or(encoded);
    STANDARD
        .decode(payload.trim())
        .context("invalid base64 payload")
}
