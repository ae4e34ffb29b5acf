// src/source.rs - Lifecycle contract between a query host and a data source
use crate::backend::AlarmBackend;
use crate::error::{Result, ViewError};
use crate::page::Page;
use crate::schema::Column;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Handles a data source receives when the host initializes it
#[derive(Clone)]
pub struct InitArgs {
    /// Alarm backend used for every later request
    pub backend: Arc<dyn AlarmBackend>,
    /// Runtime the fetch task is spawned on
    pub runtime: Handle,
}

impl InitArgs {
    /// Use the runtime of the calling context
    pub fn new(backend: Arc<dyn AlarmBackend>) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            ViewError::NotInitialized(format!("no async runtime available: {}", e))
        })?;
        Ok(Self { backend, runtime })
    }

    pub fn with_runtime(backend: Arc<dyn AlarmBackend>, runtime: Handle) -> Self {
        Self { backend, runtime }
    }
}

/// Query host lifecycle.
///
/// Hosts call `on_init`, `on_arguments_processed`, `on_prepare_fetch` and then
/// `next_page` until a page reports no continuation. `columns` may be called at
/// any point.
#[async_trait]
pub trait DataSource: Send {
    fn on_init(&mut self, args: InitArgs) -> Result<()>;

    fn on_arguments_processed(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_prepare_fetch(&mut self) -> Result<()>;

    fn columns(&self) -> &'static [Column];

    async fn next_page(&mut self) -> Result<Page>;
}
