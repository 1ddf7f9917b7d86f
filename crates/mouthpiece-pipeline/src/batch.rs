use crate::error::StageFailure;
use crate::orchestrator::UtterancePipeline;
use futures_util::{stream, StreamExt, TryStreamExt};
use mouthpiece_types::{ResponseUtterance, Utterance};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Runs the utterance pipeline across a batch, preserving input order.
///
/// The batch is all-or-nothing: the first failure (in input order) aborts it,
/// results already produced are discarded, and runs still in flight are
/// dropped, which kills their subprocesses and removes their artifacts.
pub struct BatchSequencer {
    pipeline: Arc<UtterancePipeline>,
    max_in_flight: usize,
}

impl BatchSequencer {
    /// Creates a strictly sequential sequencer.
    pub fn new(pipeline: Arc<UtterancePipeline>) -> Self {
        Self {
            pipeline,
            max_in_flight: 1,
        }
    }

    /// Allows up to `max_in_flight` utterances to run at once. Output order is
    /// unaffected. Values below 1 are treated as 1.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    pub fn pipeline(&self) -> &UtterancePipeline {
        &self.pipeline
    }

    pub async fn process_all(
        &self,
        utterances: &[Utterance],
    ) -> Result<Vec<ResponseUtterance>, StageFailure> {
        let started = Instant::now();

        // Collected first: a borrowing `map` closure makes the returned future
        // fail `Send` checks for callers such as axum handlers.
        let runs: Vec<_> = utterances
            .iter()
            .enumerate()
            .map(|(index, utterance)| self.pipeline.run(index, utterance))
            .collect();

        let result = stream::iter(runs)
            .buffered(self.max_in_flight)
            .try_collect::<Vec<_>>()
            .await;

        match &result {
            Ok(responses) => info!(
                count = responses.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "batch complete"
            ),
            Err(failure) => warn!(
                index = failure.index,
                stage = failure.stage.as_str(),
                total = utterances.len(),
                "batch aborted: {}",
                failure
            ),
        }
        result
    }
}
