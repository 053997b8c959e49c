//! Main client implementation for the CellStore data API.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::table::Table;
use crate::transport::DataTransport;

/// Main client for the CellStore data API.
///
/// The client pairs an injected transport with default policy prototypes
/// and hands out [`Table`] handles. It is cheap to clone and safe to share:
/// the transport is used in a read-only fashion (issuing independent
/// calls), and all mutable state lives inside individual operations.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use cellstore::{Client, DataTransport};
///
/// fn build(transport: Arc<dyn DataTransport>) {
///     let client = Client::new(transport);
///     let table = client.table("projects/demo/tables/metrics");
///     let _ = table;
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn DataTransport>,
    config: ClientConfig,
}

impl Client {
    /// Create a client with the default configuration.
    pub fn new(transport: Arc<dyn DataTransport>) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    /// Create a client with an explicit configuration.
    pub fn with_config(transport: Arc<dyn DataTransport>, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner { transport, config }),
        }
    }

    /// A handle to the operations of `table_name`.
    pub fn table(&self, table_name: impl Into<String>) -> Table {
        Table::new(self.clone(), table_name.into())
    }

    pub(crate) fn transport(&self) -> &dyn DataTransport {
        self.inner.transport.as_ref()
    }

    pub(crate) fn transport_arc(&self) -> Arc<dyn DataTransport> {
        Arc::clone(&self.inner.transport)
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        &self.inner.config
    }
}
