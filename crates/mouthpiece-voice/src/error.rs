use crate::invoker::{ToolError, ToolExecutionError};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("required tool is unavailable: {0}")]
    ToolUnavailable(String),

    #[error(transparent)]
    ToolExecution(#[from] ToolExecutionError),

    #[error("`{command_line}` timed out after {} seconds", .timeout.as_secs())]
    ToolTimeout {
        command_line: String,
        timeout: Duration,
    },

    #[error("speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("phoneme analysis failed: {0}")]
    Analysis(String),

    #[error("artifact I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ToolError> for VoiceError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Unavailable { program, source } => {
                VoiceError::ToolUnavailable(format!("{}: {}", program, source))
            }
            ToolError::Timeout {
                command_line,
                timeout,
            } => VoiceError::ToolTimeout {
                command_line,
                timeout,
            },
            ToolError::Execution(e) => VoiceError::ToolExecution(e),
            ToolError::Io(e) => VoiceError::Io(e),
        }
    }
}
