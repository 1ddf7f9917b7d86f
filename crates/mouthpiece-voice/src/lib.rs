//! Media adapters for the Mouthpiece utterance pipeline.
//!
//! Each stage of the pipeline talks to an external collaborator through an
//! adapter defined here:
//!
//! - [`invoker`] runs external executables with captured output and a timeout.
//! - [`tts`] calls the remote speech-synthesis service.
//! - [`transcode`] converts synthesized audio into the analyzer's input format.
//! - [`lipsync`] runs the phoneme-timing tool and parses its viseme output.
//!
//! Synthesis, transcoding and analysis are exposed as traits so the
//! orchestrator can be driven by alternative engines or by test doubles.

pub mod config;
pub mod error;
pub mod invoker;
pub mod lipsync;
pub mod transcode;
pub mod tts;

pub use config::SynthesisConfig;
pub use error::VoiceError;
pub use invoker::{ToolCommand, ToolError, ToolExecutionError, ToolInvoker};
pub use lipsync::{PhonemeAnalyzer, RhubarbAnalyzer};
pub use transcode::{AudioTranscoder, FfmpegTranscoder};
pub use tts::{ElevenLabsSynthesizer, SpeechSynthesizer, VoiceCatalog};
