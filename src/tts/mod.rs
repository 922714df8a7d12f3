//! Speech route.
//!
//! # Data Flow
//! ```text
//! POST /tts {text, speaker, speed, is_phoneme}
//!     → SpeechSynthesizer (blocking pool) → Waveform
//!     → wav.rs (16-bit PCM WAV)
//!     → transcoder.rs (external process, stdin → stdout)
//!     → audio/mpeg bytes
//! ```
//!
//! The synthesizer is an external collaborator; the gateway only defines the
//! trait it must implement.

pub mod transcoder;
pub mod wav;

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

pub use transcoder::Transcoder;
pub use wav::encode_wav;

/// Inbound synthesis request.
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
    pub speaker: String,
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// `text` is already a phoneme sequence.
    #[serde(default)]
    pub is_phoneme: bool,
}

fn default_speed() -> f32 {
    1.0
}

/// Mono audio in the range [-1.0, 1.0].
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

/// Errors from the speech pipeline.
#[derive(Debug, Error)]
pub enum TtsError {
    /// The synthesizer rejected or failed the request.
    #[error("synthesis failed: {0}")]
    Synthesis(String),

    /// WAV encoding failed.
    #[error("wav encoding failed: {0}")]
    Encode(#[from] hound::Error),

    /// The transcoder could not run or exited non-zero.
    #[error("Transcoder error: {0}")]
    Transcoder(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Text-to-waveform inference, supplied by the embedding application.
///
/// Called on the blocking thread pool.
pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize(&self, request: &SynthesisRequest) -> Result<Waveform, TtsError>;
}

/// Synthesizer plus transcoder.
#[derive(Clone)]
pub struct TtsService {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    transcoder: Transcoder,
}

impl TtsService {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, transcoder: Transcoder) -> Self {
        Self {
            synthesizer,
            transcoder,
        }
    }

    /// Synthesize, encode, and transcode `request`.
    pub async fn render(&self, request: SynthesisRequest) -> Result<Vec<u8>, TtsError> {
        let synthesizer = Arc::clone(&self.synthesizer);
        let wav = tokio::task::spawn_blocking(move || {
            let waveform = synthesizer.synthesize(&request)?;
            tracing::debug!(
                speaker = %request.speaker,
                sample_rate = waveform.sample_rate,
                samples = waveform.samples.len(),
                "Synthesized waveform"
            );
            Ok::<_, TtsError>(encode_wav(&waveform)?)
        })
        .await
        .map_err(|e| TtsError::Synthesis(format!("synthesis task failed: {}", e)))??;

        self.transcoder.transcode(wav).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults() {
        let req: SynthesisRequest =
            serde_json::from_str(r#"{"text": "hello", "speaker": "miku"}"#).unwrap();
        assert_eq!(req.speed, 1.0);
        assert!(!req.is_phoneme);
    }

    struct Failing;

    impl SpeechSynthesizer for Failing {
        fn synthesize(&self, _: &SynthesisRequest) -> Result<Waveform, TtsError> {
            Err(TtsError::Synthesis("unknown speaker".into()))
        }
    }

    #[tokio::test]
    async fn synthesis_errors_propagate() {
        let service = TtsService::new(Arc::new(Failing), Transcoder::new("cat", vec![]));
        let err = service
            .render(SynthesisRequest {
                text: "x".into(),
                speaker: "nobody".into(),
                speed: 1.0,
                is_phoneme: false,
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "synthesis failed: unknown speaker");
    }
}
