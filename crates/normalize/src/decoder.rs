//! Dedicated HEIC/HEIF decoding.
//!
//! The decoder sits behind [`HeifDecoder`] so the normalizer can run without
//! one, and so tests can substitute their own.

use std::io::{self, Read, Write};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::error::ConversionError;

/// Turns a HEIC/HEIF still into JPEG bytes.
pub trait HeifDecoder: Send + Sync {
    fn decode_to_jpeg(&self, bytes: &[u8], quality: u8) -> Result<Vec<u8>, ConversionError>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "heif-decoder"
    }
}

/// Placeholder in the argument list replaced by the requested quality.
pub const QUALITY_PLACEHOLDER: &str = "{quality}";

/// Pipes the input through an external converter over stdin/stdout.
///
/// The default invocation is `magick heic:- -quality {quality} jpeg:-`.
/// A converter still running after the deadline is killed and reaped.
#[derive(Debug, Clone)]
pub struct CommandDecoder {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

/// Deadline applied when none is configured.
pub const DEFAULT_DECODER_TIMEOUT: Duration = Duration::from_secs(60);

impl CommandDecoder {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: DEFAULT_DECODER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn imagemagick() -> Self {
        Self::new("magick", default_args())
    }

    fn resolved_args(&self, quality: u8) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(QUALITY_PLACEHOLDER, &quality.to_string()))
            .collect()
    }
}

impl Default for CommandDecoder {
    fn default() -> Self {
        Self::imagemagick()
    }
}

pub fn default_args() -> Vec<String> {
    ["heic:-", "-quality", QUALITY_PLACEHOLDER, "jpeg:-"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl HeifDecoder for CommandDecoder {
    fn decode_to_jpeg(&self, bytes: &[u8], quality: u8) -> Result<Vec<u8>, ConversionError> {
        let mut child = Command::new(&self.program)
            .args(self.resolved_args(quality))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ConversionError::Decoder(format!("failed to spawn {}: {e}", self.program)))?;

        let pipes = (child.stdin.take(), child.stdout.take(), child.stderr.take());
        let (stdin, stdout, stderr) = match pipes {
            (Some(stdin), Some(stdout), Some(stderr)) => (stdin, stdout, stderr),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ConversionError::Decoder("decoder pipes unavailable".into()));
            }
        };

        // Pipes are serviced off this thread so a full pipe cannot stall the
        // deadline. The threads are detached on timeout and end once the
        // killed process closes its side.
        let input = bytes.to_vec();
        let writer = thread::spawn(move || {
            let mut stdin = stdin;
            stdin.write_all(&input)
        });
        let out_reader = thread::spawn(move || read_to_end(stdout));
        let err_reader = thread::spawn(move || read_to_end(stderr));

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ConversionError::Decoder(format!(
                    "{} timed out after {}ms",
                    self.program,
                    self.timeout.as_millis()
                )));
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ConversionError::Decoder(format!(
                    "failed to wait for {}: {e}",
                    self.program
                )));
            }
        };

        let written = join_pipe(writer);
        let stdout = join_pipe(out_reader);
        let stderr = join_pipe(err_reader).unwrap_or_default();

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(ConversionError::Decoder(format!(
                "{} exited with {}: {}",
                self.program,
                status,
                stderr.trim()
            )));
        }
        if let Err(e) = written {
            return Err(ConversionError::Decoder(format!("failed to write input: {e}")));
        }
        let stdout = stdout
            .map_err(|e| ConversionError::Decoder(format!("failed to read output: {e}")))?;

        if stdout.is_empty() {
            return Err(ConversionError::Decoder(format!(
                "{} produced no output",
                self.program
            )));
        }
        Ok(stdout)
    }

    fn name(&self) -> &str {
        &self.program
    }
}

fn read_to_end(mut pipe: impl Read) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf)?;
    Ok(buf)
}

fn join_pipe<T>(handle: JoinHandle<io::Result<T>>) -> io::Result<T> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("pipe thread panicked")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_placeholder_is_substituted() {
        let dec = CommandDecoder::imagemagick();
        assert_eq!(
            dec.resolved_args(90),
            vec!["heic:-", "-quality", "90", "jpeg:-"]
        );
    }

    #[test]
    fn missing_program_is_a_decoder_error() {
        let dec = CommandDecoder::new("photomod-no-such-converter", default_args());
        let err = dec.decode_to_jpeg(b"bytes", 90).unwrap_err();
        assert!(matches!(err, ConversionError::Decoder(msg) if msg.contains("failed to spawn")));
    }

    #[cfg(unix)]
    #[test]
    fn hung_converter_is_killed_at_the_deadline() {
        let dec = CommandDecoder::new("sh", vec!["-c".into(), "exec sleep 30".into()])
            .with_timeout(Duration::from_millis(300));
        let start = std::time::Instant::now();
        let err = dec.decode_to_jpeg(b"heic bytes", 90).unwrap_err();
        assert!(start.elapsed() < Duration::from_secs(10));
        assert!(matches!(err, ConversionError::Decoder(msg) if msg.contains("timed out")));
    }

    #[cfg(unix)]
    #[test]
    fn converter_output_is_returned() {
        let dec = CommandDecoder::new("cat", Vec::new());
        let out = dec.decode_to_jpeg(b"\xFF\xD8jpeg", 90).unwrap();
        assert_eq!(out, b"\xFF\xD8jpeg");
    }

    #[cfg(unix)]
    #[test]
    fn failing_converter_reports_stderr() {
        let dec = CommandDecoder::new("sh", vec!["-c".into(), "echo broken >&2; exit 3".into()]);
        let err = dec.decode_to_jpeg(b"x", 90).unwrap_err();
        assert!(matches!(err, ConversionError::Decoder(msg) if msg.contains("broken")));
    }
}
