use futures::future::FutureObj;
use futures::task::{Spawn, SpawnError};
use tokio::runtime::Handle;

/// Spawns onto the ambient tokio runtime.
///
/// Outside a runtime every spawn fails with [`SpawnError::shutdown`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSpawner;

impl Spawn for TokioSpawner {
    fn spawn_obj(&self, future: FutureObj<'static, ()>) -> Result<(), SpawnError> {
        let handle = Handle::try_current().map_err(|err| {
            tracing::warn!(error = %err, "no tokio runtime available for async node");
            SpawnError::shutdown()
        })?;
        handle.spawn(future);
        Ok(())
    }
}
