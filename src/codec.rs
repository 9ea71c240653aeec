use std::io::Cursor;

use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};

use crate::{
    error::{LabelError, LabelResult},
    format::{Codec, ImageExt},
};

/// JPEG quality used when re-encoding.
pub const JPEG_QUALITY: u8 = 75;

#[derive(Clone, Debug)]
pub struct DecodedImage {
    pub image: DynamicImage,
    /// Codec detected from the byte stream's magic markers.
    pub codec: Codec,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Decode by content sniffing. Only JPEG and PNG are accepted.
pub fn decode(bytes: &[u8]) -> LabelResult<DecodedImage> {
    let format = image::guess_format(bytes)
        .map_err(|e| LabelError::decode(format!("unrecognized image data: {e}")))?;
    let codec = Codec::from_image_format(format).ok_or_else(|| {
        LabelError::decode(format!("unsupported image format {format:?}"))
    })?;
    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| LabelError::decode(format!("{} decode failed: {e}", codec.name())))?;
    Ok(DecodedImage { image, codec })
}

/// Encode with the codec's default settings: lossless PNG, JPEG at [`JPEG_QUALITY`].
///
/// JPEG has no alpha channel, so pixels are composited over black first.
pub fn encode(image: &RgbaImage, codec: Codec) -> LabelResult<Vec<u8>> {
    let (width, height) = image.dimensions();
    let mut buf = Vec::new();
    let result = match codec {
        Codec::Png => image::codecs::png::PngEncoder::new(Cursor::new(&mut buf)).write_image(
            image.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
        Codec::Jpeg => {
            let rgb = flatten_over_black(image);
            image::codecs::jpeg::JpegEncoder::new_with_quality(
                Cursor::new(&mut buf),
                JPEG_QUALITY,
            )
            .write_image(&rgb, width, height, ExtendedColorType::Rgb8)
        }
    };
    result.map_err(|e| LabelError::encode(format!("{} encode failed: {e}", codec.name())))?;
    Ok(buf)
}

/// Encode for a raw extension string. Anything but `jpg`, `jpeg` or `png` is an error.
pub fn encode_for_extension(image: &RgbaImage, extension: &str) -> LabelResult<Vec<u8>> {
    let ext = ImageExt::parse(extension)
        .ok_or_else(|| LabelError::encode(format!("unsupported extension '{extension}'")))?;
    encode(image, ext.codec())
}

fn flatten_over_black(image: &RgbaImage) -> Vec<u8> {
    let mut out = Vec::with_capacity(image.as_raw().len() / 4 * 3);
    for px in image.as_raw().chunks_exact(4) {
        let a = px[3] as u16;
        for &c in &px[..3] {
            out.push(((c as u16 * a + 127) / 255) as u8);
        }
    }
    out
}

/// What to do when the sniffed codec disagrees with the key's extension.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Fail the record; nothing is written.
    #[default]
    Reject,
    /// Re-encode in the sniffed codec with its canonical content type.
    FollowContent,
    /// Re-encode per the extension regardless of content.
    TrustExtension,
}

/// Codec and content type chosen for the output object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputFormat {
    pub codec: Codec,
    pub content_type: String,
}

pub fn resolve_output_format(
    ext: ImageExt,
    sniffed: Codec,
    policy: MismatchPolicy,
) -> LabelResult<OutputFormat> {
    let expected = ext.codec();
    if expected == sniffed {
        return Ok(OutputFormat {
            codec: expected,
            content_type: ext.content_type(),
        });
    }

    match policy {
        MismatchPolicy::Reject => Err(LabelError::FormatMismatch {
            extension: ext.as_str(),
            sniffed: sniffed.name(),
        }),
        MismatchPolicy::FollowContent => Ok(OutputFormat {
            codec: sniffed,
            content_type: sniffed.content_type().to_string(),
        }),
        MismatchPolicy::TrustExtension => {
            tracing::warn!(
                extension = ext.as_str(),
                sniffed = sniffed.name(),
                "content does not match extension; encoding per extension"
            );
            Ok(OutputFormat {
                codec: expected,
                content_type: ext.content_type(),
            })
        }
    }
}
