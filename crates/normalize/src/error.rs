use thiserror::Error;

/// Errors surfaced by [`crate::Normalizer::normalize`].
///
/// Callers decide the fallback policy; the normalizer itself never hands back
/// the untouched original.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// No bytes to convert.
    #[error("image payload is empty")]
    Empty,
    /// The dedicated HEIC/HEIF decoder could not produce an image.
    #[error("dedicated decoder failed: {0}")]
    Decoder(String),
    /// The general codec could not read the input.
    #[error("general codec could not decode image: {0}")]
    Decode(String),
    /// Encoding the canonical JPEG failed.
    #[error("jpeg encode failed: {0}")]
    Encode(String),
    /// Both decode paths failed.
    #[error("unable to convert image format (decoder: {decoder}; codec: {codec})")]
    Unsupported { decoder: String, codec: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_mentions_both_paths() {
        let err = ConversionError::Unsupported {
            decoder: "magick exited with 1".into(),
            codec: "unknown format".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("magick exited with 1"));
        assert!(msg.contains("unknown format"));
    }
}
