//! Format normalization for inbound photos.
//!
//! Any still image we can read comes out as a canonical JPEG. HEIC/HEIF input
//! is tried on the dedicated decoder first; whatever the first pass produced
//! is then re-encoded by the general codec so the output does not depend on
//! which decode path ran.
//!
//! ```no_run
//! use normalize::{EncodingHint, NormalizeConfig, NormalizeOptions, Normalizer};
//!
//! let bytes = std::fs::read("IMG_0042.HEIC").unwrap();
//! let normalizer = Normalizer::from_config(&NormalizeConfig::default());
//! let jpeg = normalizer
//!     .normalize(&bytes, &EncodingHint::from_filename("IMG_0042.HEIC"), NormalizeOptions::final_artifact())
//!     .unwrap();
//! assert_eq!(jpeg.mime(), "image/jpeg");
//! ```

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

pub mod codec;
mod config;
mod decoder;
mod error;
mod types;

pub use crate::config::NormalizeConfig;
pub use crate::decoder::{
    CommandDecoder, HeifDecoder, DEFAULT_DECODER_TIMEOUT, QUALITY_PLACEHOLDER,
};
pub use crate::error::ConversionError;
pub use crate::types::{
    DecodePath, EncodingHint, NormalizeOptions, NormalizedPhoto, OUTPUT_MIME,
};

/// Stateless converter; cheap to clone and share across requests.
#[derive(Clone, Default)]
pub struct Normalizer {
    decoder: Option<Arc<dyn HeifDecoder>>,
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer")
            .field("decoder", &self.decoder.as_ref().map(|d| d.name().to_string()))
            .finish()
    }
}

impl Normalizer {
    /// Normalizer with the general codec only.
    pub fn without_decoder() -> Self {
        Self { decoder: None }
    }

    pub fn with_decoder(decoder: Arc<dyn HeifDecoder>) -> Self {
        Self {
            decoder: Some(decoder),
        }
    }

    pub fn from_config(cfg: &NormalizeConfig) -> Self {
        match cfg.decoder_program.as_deref() {
            Some(program) if !program.trim().is_empty() => Self::with_decoder(Arc::new(
                CommandDecoder::new(program, cfg.decoder_args.clone())
                    .with_timeout(cfg.decoder_timeout()),
            )),
            _ => Self::without_decoder(),
        }
    }

    pub fn has_decoder(&self) -> bool {
        self.decoder.is_some()
    }

    /// Convert `bytes` into a canonical JPEG.
    ///
    /// Fails closed: if neither decode path can read the input the caller gets
    /// [`ConversionError`], never the original bytes.
    pub fn normalize(
        &self,
        bytes: &[u8],
        hint: &EncodingHint,
        opts: NormalizeOptions,
    ) -> Result<NormalizedPhoto, ConversionError> {
        if bytes.is_empty() {
            return Err(ConversionError::Empty);
        }
        let start = Instant::now();
        let quality = opts.clamped_quality();

        let (intermediate, path) = self.first_pass(bytes, hint, quality)?;

        let img = codec::decode(&intermediate)?;
        let (width, height) = (img.width(), img.height());
        let out = codec::encode_jpeg(&img, quality, opts.progressive)?;

        debug!(
            mime = hint.mime(),
            path = ?path,
            width,
            height,
            quality,
            progressive = opts.progressive,
            input_len = bytes.len(),
            output_len = out.len(),
            elapsed_micros = start.elapsed().as_micros(),
            "normalize_success"
        );

        Ok(NormalizedPhoto {
            bytes: out,
            width,
            height,
            quality,
            progressive: opts.progressive,
            path,
        })
    }

    fn first_pass(
        &self,
        bytes: &[u8],
        hint: &EncodingHint,
        quality: u8,
    ) -> Result<(Vec<u8>, DecodePath), ConversionError> {
        let decoder_err = match (&self.decoder, hint.is_proprietary()) {
            (Some(decoder), true) => match decoder.decode_to_jpeg(bytes, quality) {
                Ok(jpeg) => return Ok((jpeg, DecodePath::DedicatedDecoder)),
                Err(err) => {
                    warn!(decoder = decoder.name(), error = %err, "dedicated_decode_failed");
                    Some(err)
                }
            },
            (None, true) => Some(ConversionError::Decoder("no dedicated decoder configured".into())),
            (_, false) => None,
        };

        match codec::reencode(bytes, quality, false) {
            Ok(jpeg) => Ok((jpeg, DecodePath::GeneralCodec)),
            Err(codec_err) => {
                warn!(mime = hint.mime(), error = %codec_err, "general_codec_failed");
                Err(match decoder_err {
                    Some(decoder_err) => ConversionError::Unsupported {
                        decoder: decoder_err.to_string(),
                        codec: codec_err.to_string(),
                    },
                    None => codec_err,
                })
            }
        }
    }
}
