use crate::bulk::{BulkConfig, BulkCopyExecutor, BulkResult, BulkUpdateExecutor, RecordGenerator};
use rocket_db_pools::sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// Everything the customer routes need besides the pool itself.
#[derive(Clone)]
pub struct BulkServices {
    pub config: BulkConfig,
    pub generator: RecordGenerator,
    pub copier: BulkCopyExecutor,
    pub updater: BulkUpdateExecutor,
}

impl BulkServices {
    pub fn new(pool: PgPool, config: BulkConfig) -> BulkResult<Self> {
        let generator = RecordGenerator::from_config(&config)?;
        Ok(Self {
            copier: BulkCopyExecutor::new(pool.clone(), config.clone()),
            updater: BulkUpdateExecutor::new(pool, config.clone()),
            generator,
            config,
        })
    }
}

/// Process-wide token cancelled when the server shuts down.
///
/// Requests work against child tokens, so shutdown reaches every in-flight
/// write while a single request can still be cancelled on its own.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(CancellationToken);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(&self) -> CancellationToken {
        self.0.child_token()
    }

    pub fn trigger(&self) {
        self.0.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.0.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_reaches_children() {
        let signal = ShutdownSignal::new();
        let first = signal.child();
        let second = signal.child();
        assert!(!first.is_cancelled());

        signal.trigger();

        assert!(signal.is_triggered());
        assert!(first.is_cancelled());
        assert!(second.is_cancelled());
    }

    #[test]
    fn cancelling_a_child_leaves_siblings_alone() {
        let signal = ShutdownSignal::new();
        let first = signal.child();
        let second = signal.child();

        first.cancel();

        assert!(!second.is_cancelled());
        assert!(!signal.is_triggered());
    }
}
