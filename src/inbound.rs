//! Inbound photo parsing and size policy.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use bytes::Bytes;
use normalize::EncodingHint;

use crate::error::PipelineError;

/// Default ceiling on the decoded image: 5 MiB.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Base64 inflation plus data-URL framing allowed on the encoded form.
pub const ENCODING_OVERHEAD: f64 = 1.37;

/// Largest encoded string accepted for a given decoded-byte ceiling.
pub fn max_encoded_len(max_bytes: usize) -> usize {
    (max_bytes as f64 * ENCODING_OVERHEAD).ceil() as usize
}

/// Accepts padded or unpadded payloads.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Photo as received from the client; lives for one request only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundPhoto {
    mime: String,
    bytes: Bytes,
    encoded_len: usize,
}

impl InboundPhoto {
    /// Parse `data:<mime>;base64,<payload>` (or a bare base64 payload).
    ///
    /// Both size measures are enforced here, before anything leaves the
    /// process: the encoded length against `max_bytes × 1.37`, then the
    /// decoded length against `max_bytes`.
    pub fn parse(image: &str, max_bytes: usize) -> Result<Self, PipelineError> {
        let image = image.trim();
        let encoded_len = image.len();
        let encoded_limit = max_encoded_len(max_bytes);
        if encoded_len > encoded_limit {
            return Err(PipelineError::TooLarge {
                measure: "encoded chars",
                measured: encoded_len,
                limit: encoded_limit,
            });
        }

        let (mime, payload) = split_data_url(image)?;
        // Line-wrapped payloads are common from mobile clients.
        let payload: Vec<u8> = payload
            .bytes()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        let bytes = LENIENT
            .decode(payload)
            .map_err(|e| PipelineError::InvalidImage(e.to_string()))?;
        if bytes.is_empty() {
            return Err(PipelineError::InvalidImage("empty payload".into()));
        }
        if bytes.len() > max_bytes {
            return Err(PipelineError::TooLarge {
                measure: "bytes",
                measured: bytes.len(),
                limit: max_bytes,
            });
        }

        Ok(Self {
            mime: mime.to_ascii_lowercase(),
            bytes: Bytes::from(bytes),
            encoded_len,
        })
    }

    /// Declared MIME, lowercased; empty when there was no data-URL prefix.
    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn encoded_len(&self) -> usize {
        self.encoded_len
    }

    pub fn hint(&self) -> EncodingHint {
        EncodingHint::resolve(&self.mime, &self.bytes)
    }

    /// HEIC/HEIF input that needs conversion before a browser can show it.
    pub fn is_proprietary(&self) -> bool {
        self.hint().is_proprietary()
    }
}

fn split_data_url(image: &str) -> Result<(&str, &str), PipelineError> {
    let Some(rest) = image.strip_prefix("data:") else {
        return Ok(("", image));
    };
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| PipelineError::InvalidImage("data URL has no payload".into()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| PipelineError::InvalidImage("data URL is not base64-encoded".into()))?;
    // Parameters such as `;name=x` may precede `;base64`.
    let mime = mime.split(';').next().unwrap_or_default();
    Ok((mime, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};

    fn data_url(mime: &str, bytes: &[u8]) -> String {
        format!("data:{mime};base64,{}", STANDARD.encode(bytes))
    }

    #[test]
    fn parses_data_url() {
        let photo = InboundPhoto::parse(&data_url("image/JPEG", b"\xFF\xD8\xFFabc"), MAX_IMAGE_BYTES)
            .unwrap();
        assert_eq!(photo.mime(), "image/jpeg");
        assert_eq!(photo.bytes().as_ref(), b"\xFF\xD8\xFFabc");
        assert!(!photo.is_proprietary());
    }

    #[test]
    fn bare_base64_has_empty_mime() {
        let photo = InboundPhoto::parse(&STANDARD.encode(b"hello"), MAX_IMAGE_BYTES).unwrap();
        assert_eq!(photo.mime(), "");
        assert_eq!(photo.len(), 5);
    }

    #[test]
    fn heic_mime_is_proprietary() {
        let photo = InboundPhoto::parse(&data_url("image/heic", b"x"), MAX_IMAGE_BYTES).unwrap();
        assert!(photo.is_proprietary());
    }

    #[test]
    fn mime_parameters_are_dropped() {
        let url = format!("data:image/heif;name=a.heif;base64,{}", STANDARD.encode(b"x"));
        let photo = InboundPhoto::parse(&url, MAX_IMAGE_BYTES).unwrap();
        assert_eq!(photo.mime(), "image/heif");
    }

    #[test]
    fn unpadded_and_wrapped_payloads_decode() {
        let bytes = b"\xFF\xD8\xFFwrapped payload";
        let unpadded = format!("data:image/jpeg;base64,{}", STANDARD_NO_PAD.encode(bytes));
        let photo = InboundPhoto::parse(&unpadded, MAX_IMAGE_BYTES).unwrap();
        assert_eq!(photo.bytes().as_ref(), bytes);

        let encoded = STANDARD.encode(bytes);
        let (head, tail) = encoded.split_at(12);
        let wrapped = format!("data:image/jpeg;base64,{head}\r\n{tail}\n");
        let photo = InboundPhoto::parse(&wrapped, MAX_IMAGE_BYTES).unwrap();
        assert_eq!(photo.bytes().as_ref(), bytes);
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let err = InboundPhoto::parse("data:image/png;base64,@@@", MAX_IMAGE_BYTES).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidImage(_)));
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn non_base64_data_url_is_rejected() {
        let err = InboundPhoto::parse("data:image/png,raw", MAX_IMAGE_BYTES).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidImage(_)));
    }

    #[test]
    fn exactly_at_limit_is_accepted() {
        let bytes = vec![7u8; 1024];
        assert!(InboundPhoto::parse(&data_url("image/png", &bytes), 1024).is_ok());
    }

    #[test]
    fn one_byte_over_is_rejected() {
        let bytes = vec![7u8; 1025];
        let err = InboundPhoto::parse(&data_url("image/png", &bytes), 1024).unwrap_err();
        assert_eq!(err.status(), 413);
    }

    #[test]
    fn oversized_encoding_is_rejected_before_decoding() {
        let huge = "A".repeat(max_encoded_len(1024) + 1);
        let err = InboundPhoto::parse(&huge, 1024).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::TooLarge {
                measure: "encoded chars",
                ..
            }
        ));
    }

    #[test]
    fn five_mebibytes_fit_the_encoded_ceiling() {
        let encoded = STANDARD.encode(vec![0u8; MAX_IMAGE_BYTES]).len() + "data:image/jpeg;base64,".len();
        assert!(encoded <= max_encoded_len(MAX_IMAGE_BYTES));
    }
}
