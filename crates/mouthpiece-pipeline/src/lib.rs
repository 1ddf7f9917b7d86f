//! The per-message media pipeline.
//!
//! [`UtterancePipeline`] drives one utterance through synthesis, transcoding,
//! phoneme analysis and loading; [`BatchSequencer`] runs it across an ordered
//! list with fail-fast, whole-batch semantics. Artifacts for each run live in
//! an [`ArtifactStore`] under names derived from the run's
//! [`ArtifactId`](mouthpiece_types::ArtifactId).

pub mod artifact;
pub mod batch;
pub mod canned;
pub mod error;
pub mod orchestrator;

pub use artifact::{ArtifactSet, ArtifactStore};
pub use batch::BatchSequencer;
pub use canned::{CannedClip, CannedLibrary};
pub use error::{Stage, StageFailure};
pub use orchestrator::UtterancePipeline;
