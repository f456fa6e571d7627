// ABOUTME: Error type for pipeline execution.
// ABOUTME: Distinguishes a clean rollback from a rollback that itself failed.

/// Failure of a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError<E>
where
    E: std::error::Error + 'static,
{
    /// A step failed and every completed step was rolled back.
    #[error("{source}")]
    StepFailed {
        step: String,
        #[source]
        source: E,
    },

    /// A step failed and rolling back also failed; state may be inconsistent.
    #[error("{message}\nerror: {source}\nrollback error: {rollback_error}")]
    RollbackFailed {
        message: String,
        step: String,
        #[source]
        source: E,
        rollback_step: String,
        rollback_error: E,
    },
}

impl<E> PipelineError<E>
where
    E: std::error::Error + 'static,
{
    /// Name of the step whose forward operation failed.
    pub fn failed_step(&self) -> &str {
        match self {
            PipelineError::StepFailed { step, .. } | PipelineError::RollbackFailed { step, .. } => {
                step
            }
        }
    }

    /// The forward error that started the rollback.
    pub fn step_error(&self) -> &E {
        match self {
            PipelineError::StepFailed { source, .. }
            | PipelineError::RollbackFailed { source, .. } => source,
        }
    }

    /// True when rollback did not complete and manual checks are needed.
    pub fn is_rollback_failure(&self) -> bool {
        matches!(self, PipelineError::RollbackFailed { .. })
    }
}
