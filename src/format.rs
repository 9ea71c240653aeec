//! Extension-based classification of object keys.

/// Codec family behind an extension or a sniffed byte stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Codec {
    Jpeg,
    Png,
}

impl Codec {
    pub fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }

    pub fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
        }
    }

    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Png => Some(Self::Png),
            _ => None,
        }
    }

    /// Canonical MIME type, used when the content (not the key) picks the codec.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// Supported key extension. `jpg` and `jpeg` are kept distinct so the
/// content type echoes the key verbatim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageExt {
    Jpg,
    Jpeg,
    Png,
}

impl ImageExt {
    pub const ALL: [ImageExt; 3] = [ImageExt::Jpg, ImageExt::Jpeg, ImageExt::Png];

    /// Lowercase extension without the leading dot.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }

    pub fn parse(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(ext))
    }

    pub fn codec(self) -> Codec {
        match self {
            Self::Jpg | Self::Jpeg => Codec::Jpeg,
            Self::Png => Codec::Png,
        }
    }

    /// `image/<ext>`; `jpg` is not normalized to `jpeg`.
    pub fn content_type(self) -> String {
        format!("image/{}", self.as_str())
    }
}

impl std::fmt::Display for ImageExt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`classify_key`], shaped as a `(supported, extension)` pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    pub is_supported: bool,
    /// Empty when unsupported.
    pub extension: String,
}

/// Case-insensitive suffix match against `.jpg`, `.jpeg` and `.png`.
pub fn classify(key: &str) -> Option<ImageExt> {
    let lower = key.to_ascii_lowercase();
    ImageExt::ALL
        .into_iter()
        .find(|ext| lower.ends_with(&format!(".{}", ext.as_str())))
}

pub fn classify_key(key: &str) -> Classification {
    match classify(key) {
        Some(ext) => Classification {
            is_supported: true,
            extension: ext.as_str().to_string(),
        },
        None => Classification {
            is_supported: false,
            extension: String::new(),
        },
    }
}
