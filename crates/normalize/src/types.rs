use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// MIME type of every normalized output.
pub const OUTPUT_MIME: &str = "image/jpeg";

const GENERIC_MIMES: [&str; 2] = ["", "application/octet-stream"];

/// Advisory description of how an input is encoded.
///
/// Only used to decide whether the dedicated HEIC/HEIF decoder is tried first;
/// the general codec sniffs the real format on its own.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncodingHint {
    mime: String,
}

impl EncodingHint {
    /// Hint from a declared MIME type such as `image/heic`.
    pub fn from_mime(mime: &str) -> Self {
        Self {
            mime: mime.trim().to_ascii_lowercase(),
        }
    }

    /// Hint from a file name suffix (`IMG_0042.HEIC`).
    pub fn from_filename(name: &str) -> Self {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        let mime = match ext.as_str() {
            "heic" => "image/heic",
            "heif" => "image/heif",
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            _ => "",
        };
        Self {
            mime: mime.to_string(),
        }
    }

    /// Hint from magic bytes.
    pub fn sniff(bytes: &[u8]) -> Self {
        let mime = infer::get(bytes)
            .map(|kind| kind.mime_type())
            .unwrap_or_default();
        Self::from_mime(mime)
    }

    /// Declared MIME when it says something useful, magic bytes otherwise.
    pub fn resolve(declared_mime: &str, bytes: &[u8]) -> Self {
        let declared = Self::from_mime(declared_mime);
        if GENERIC_MIMES.contains(&declared.mime.as_str()) {
            Self::sniff(bytes)
        } else {
            declared
        }
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// HEIC/HEIF input that browsers generally cannot render.
    pub fn is_proprietary(&self) -> bool {
        self.mime.contains("heic") || self.mime.contains("heif")
    }
}

/// Encoding parameters applied by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// JPEG quality, 1..=100.
    pub quality: u8,
    /// Emit a progressive JPEG on the final pass.
    pub progressive: bool,
}

impl NormalizeOptions {
    /// Policy for artifacts handed to other systems.
    pub const fn final_artifact() -> Self {
        Self {
            quality: 95,
            progressive: true,
        }
    }

    /// Policy for the display copy returned to the client.
    pub const fn preview() -> Self {
        Self {
            quality: 90,
            progressive: false,
        }
    }

    pub(crate) fn clamped_quality(&self) -> u8 {
        self.quality.clamp(1, 100)
    }
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self::final_artifact()
    }
}

/// Which decode path produced the intermediate image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodePath {
    DedicatedDecoder,
    GeneralCodec,
}

/// Canonical JPEG produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPhoto {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub progressive: bool,
    pub path: DecodePath,
}

impl NormalizedPhoto {
    pub fn mime(&self) -> &'static str {
        OUTPUT_MIME
    }

    /// `data:image/jpeg;base64,...`
    pub fn to_data_url(&self) -> String {
        format!("data:{OUTPUT_MIME};base64,{}", self.to_base64())
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_hint_detects_heic_and_heif() {
        assert!(EncodingHint::from_mime("image/heic").is_proprietary());
        assert!(EncodingHint::from_mime("IMAGE/HEIF").is_proprietary());
        assert!(EncodingHint::from_mime("image/heic-sequence").is_proprietary());
        assert!(!EncodingHint::from_mime("image/jpeg").is_proprietary());
    }

    #[test]
    fn filename_hint_uses_suffix() {
        assert!(EncodingHint::from_filename("IMG_0042.HEIC").is_proprietary());
        assert!(EncodingHint::from_filename("photo.heif").is_proprietary());
        assert_eq!(EncodingHint::from_filename("a.JPG").mime(), "image/jpeg");
        assert_eq!(EncodingHint::from_filename("noext").mime(), "");
    }

    #[test]
    fn resolve_prefers_declared_mime() {
        let png_magic = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        let hint = EncodingHint::resolve("image/heic", &png_magic);
        assert!(hint.is_proprietary());

        let hint = EncodingHint::resolve("application/octet-stream", &png_magic);
        assert_eq!(hint.mime(), "image/png");
    }

    #[test]
    fn presets_match_policy() {
        let fin = NormalizeOptions::final_artifact();
        assert_eq!((fin.quality, fin.progressive), (95, true));
        let prev = NormalizeOptions::preview();
        assert_eq!((prev.quality, prev.progressive), (90, false));
    }

    #[test]
    fn data_url_has_jpeg_prefix() {
        let photo = NormalizedPhoto {
            bytes: vec![0xFF, 0xD8, 0xFF],
            width: 1,
            height: 1,
            quality: 90,
            progressive: false,
            path: DecodePath::GeneralCodec,
        };
        assert_eq!(photo.to_data_url(), "data:image/jpeg;base64,/9j/");
    }
}
