//! 画像の取り込み
//!
//! ファイルを読み、形式を判定してBase64にする。元のバイト列とMIMEタイプは保つ。
//! 大きすぎる画像と、バックエンドが受け付けない形式（GIF, BMP, TIFF など）だけ
//! JPEGに再エンコードする。`image` クレートが読めない HEIC/HEIF は
//! そのまま送る。

use crate::error::{DeviceTwinError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// そのまま送れるMIMEタイプ
const PASSTHROUGH_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/heic",
    "image/heif",
];

/// デコードできないが、そのまま送れるMIMEタイプ
const UNDECODED_MIME_TYPES: &[&str] = &["image/heic", "image/heif"];

/// ISO BMFF の ftyp ブランド → MIMEタイプ
const HEIF_BRANDS: &[(&[u8], &str)] = &[
    (b"heic", "image/heic"),
    (b"heix", "image/heic"),
    (b"hevc", "image/heic"),
    (b"hevx", "image/heic"),
    (b"mif1", "image/heif"),
    (b"msf1", "image/heif"),
];

const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub file_name: String,
    /// Base64エンコード済みデータ
    pub data: String,
    pub mime_type: String,
    /// 元ファイルのSHA-256（キャッシュキー用）
    pub sha256: String,
    /// 送る画像の (幅, 高さ)。デコードできない形式では None
    pub dimensions: Option<(u32, u32)>,
    /// 縮小・再エンコードしたか
    pub reencoded: bool,
}

/// ファイルから画像を読み込む
///
/// `mime_override` は再エンコードしない場合にだけ使われる
pub fn load_image(
    path: &Path,
    max_image_size: u32,
    mime_override: Option<&str>,
) -> Result<EncodedImage> {
    if !path.is_file() {
        return Err(DeviceTwinError::FileNotFound(path.display().to_string()));
    }

    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    encode_image_bytes(&bytes, &file_name, max_image_size, mime_override)
}

/// バイト列をエンコード
///
/// `max_image_size` が0なら縮小しない
pub fn encode_image_bytes(
    bytes: &[u8],
    file_name: &str,
    max_image_size: u32,
    mime_override: Option<&str>,
) -> Result<EncodedImage> {
    let sha256 = hex::encode(Sha256::digest(bytes));
    let mime_override = mime_override.filter(|m| !m.trim().is_empty());

    let format = match image::guess_format(bytes) {
        Ok(format) => format,
        Err(e) => {
            let Some(mime_type) = undecoded_mime_type(bytes, file_name, mime_override) else {
                return Err(DeviceTwinError::ImageLoad(format!(
                    "{}: unrecognized format ({})",
                    file_name, e
                )));
            };
            debug!(file = file_name, mime_type, "sending undecoded image as is");
            return Ok(EncodedImage {
                file_name: file_name.to_string(),
                data: STANDARD.encode(bytes),
                mime_type: mime_type.to_string(),
                sha256,
                dimensions: None,
                reencoded: false,
            });
        }
    };

    let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|e| DeviceTwinError::ImageLoad(format!("{}: {}", file_name, e)))?;

    let mime_type = format.to_mime_type();
    let too_large = max_image_size > 0 && width.max(height) > max_image_size;

    if !too_large && PASSTHROUGH_MIME_TYPES.contains(&mime_type) {
        return Ok(EncodedImage {
            file_name: file_name.to_string(),
            data: STANDARD.encode(bytes),
            mime_type: mime_override.unwrap_or(mime_type).to_string(),
            sha256,
            dimensions: Some((width, height)),
            reencoded: false,
        });
    }

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| DeviceTwinError::ImageLoad(format!("{}: {}", file_name, e)))?;
    let img = if too_large {
        img.resize(max_image_size, max_image_size, FilterType::Lanczos3)
    } else {
        img
    };
    let jpeg = encode_jpeg(&img)?;

    Ok(EncodedImage {
        file_name: file_name.to_string(),
        data: STANDARD.encode(&jpeg),
        mime_type: ImageFormat::Jpeg.to_mime_type().to_string(),
        sha256,
        dimensions: Some((img.width(), img.height())),
        reencoded: true,
    })
}

/// `image` クレートが判定できない画像のMIMEタイプ
///
/// 優先順位: 指定されたMIMEタイプ → ftyp ブランド → 拡張子
fn undecoded_mime_type(
    bytes: &[u8],
    file_name: &str,
    mime_override: Option<&str>,
) -> Option<&'static str> {
    if let Some(mime) = mime_override {
        let mime = mime.trim().to_ascii_lowercase();
        return UNDECODED_MIME_TYPES.iter().copied().find(|m| *m == mime);
    }

    if let Some(brand) = bytes.get(8..12).filter(|_| bytes.get(4..8) == Some(b"ftyp".as_slice())) {
        if let Some((_, mime)) = HEIF_BRANDS.iter().find(|(b, _)| *b == brand) {
            return Some(*mime);
        }
    }

    let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}

fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| DeviceTwinError::ImageLoad(format!("JPEG encode failed: {}", e)))?;
    Ok(buf)
}
