// ABOUTME: Compensating action pipeline (saga) with reverse-order rollback.
// ABOUTME: Steps run in order; on failure, completed steps are undone newest first.

mod action;
mod error;

pub use action::Action;
pub use error::PipelineError;

/// Message attached to a rollback failure when none is configured.
pub const DEFAULT_ROLLBACK_MESSAGE: &str = "Oh no. Something's gone wrong. I've tried to roll back but you should check to see if everything is OK.";

/// An ordered list of actions, built for a single run.
pub struct Pipeline<C, E> {
    steps: Vec<Box<dyn Action<C, E>>>,
    rollback_message: String,
}

impl<C, E> Pipeline<C, E>
where
    C: Send,
    E: std::error::Error + Send + 'static,
{
    pub fn new(rollback_message: impl Into<String>) -> Self {
        Self {
            steps: Vec::new(),
            rollback_message: rollback_message.into(),
        }
    }

    /// Append a step.
    pub fn then(mut self, action: impl Action<C, E> + 'static) -> Self {
        self.steps.push(Box::new(action));
        self
    }

    /// Names of the steps in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order.
    ///
    /// If step `i` fails, its `abort` runs first, then `reverse_previous` runs
    /// for steps `i-1` down to `0`, skipping steps without one. The failing
    /// step's own `reverse_previous` never runs. The first rollback error
    /// stops the rollback.
    pub async fn execute(self, ctx: &mut C) -> Result<(), PipelineError<E>> {
        for (index, step) in self.steps.iter().enumerate() {
            tracing::debug!(step = step.name(), index, "running step");

            let source = match step.forward(ctx).await {
                Ok(()) => continue,
                Err(e) => e,
            };
            tracing::warn!(step = step.name(), "step failed: {}", source);

            if let Err(rollback_error) = step.abort(ctx).await {
                tracing::error!(step = step.name(), "cleanup of failed step failed: {}", rollback_error);
                return Err(PipelineError::RollbackFailed {
                    message: self.rollback_message,
                    step: step.name().to_string(),
                    source,
                    rollback_step: step.name().to_string(),
                    rollback_error,
                });
            }

            for done in self.steps[..index].iter().rev() {
                if !done.has_reverse() {
                    continue;
                }
                tracing::info!(step = done.name(), "rolling back");
                if let Err(rollback_error) = done.reverse_previous(ctx).await {
                    tracing::error!(step = done.name(), "rollback failed: {}", rollback_error);
                    return Err(PipelineError::RollbackFailed {
                        message: self.rollback_message,
                        step: step.name().to_string(),
                        source,
                        rollback_step: done.name().to_string(),
                        rollback_error,
                    });
                }
            }

            tracing::info!(step = step.name(), "rolled back");
            return Err(PipelineError::StepFailed {
                step: step.name().to_string(),
                source,
            });
        }

        tracing::debug!(steps = self.steps.len(), "pipeline succeeded");
        Ok(())
    }
}
