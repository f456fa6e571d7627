// ABOUTME: The Action trait: a forward step plus an optional compensating rollback.
// ABOUTME: State shared between steps travels in an explicit context, never in the actions.

use async_trait::async_trait;

/// One step of a compensating pipeline.
///
/// `reverse_previous` undoes everything completed up to and including this
/// step's forward operation. It only runs when a *later* step fails, and only
/// if [`Action::has_reverse`] returns true. A step that can fail halfway
/// cleans up after itself in [`Action::abort`].
#[async_trait]
pub trait Action<C: Send, E>: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    async fn forward(&self, ctx: &mut C) -> Result<(), E>;

    /// Whether this step contributes a rollback.
    fn has_reverse(&self) -> bool {
        false
    }

    async fn reverse_previous(&self, _ctx: &mut C) -> Result<(), E> {
        Ok(())
    }

    /// Undo whatever a failed `forward` of this step left behind.
    ///
    /// Runs right after the failure, before earlier steps are reversed. An
    /// error here is a rollback failure like any other.
    async fn abort(&self, _ctx: &mut C) -> Result<(), E> {
        Ok(())
    }
}
