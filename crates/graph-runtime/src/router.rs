use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use gantry_core::{derive_thread_id, ErrorCode};

use crate::provider::{GraphProvider, GraphRun};
use crate::request::{GraphId, GraphRunRequest};

/// Dispatches run requests to registered providers by graph-id namespace.
///
/// The router is also where tenant isolation is applied: when a request
/// carries a `state_key`, the tenant-scoped `thread_id` is derived here, so
/// providers only ever see the opaque id.
pub struct GraphRouter {
    providers: HashMap<String, Arc<dyn GraphProvider>>,
}

impl GraphRouter {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register a provider under a namespace. Returns error if the
    /// namespace is already taken.
    pub fn register(
        &mut self,
        namespace: impl Into<String>,
        provider: Arc<dyn GraphProvider>,
    ) -> Result<(), RouterError> {
        let namespace = namespace.into();
        if self.providers.contains_key(&namespace) {
            return Err(RouterError::DuplicateNamespace(namespace));
        }
        self.providers.insert(namespace, provider);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Route one run request. Failures short-circuit into a canned failing
    /// run; this method never panics and never blocks.
    pub fn run(&self, mut request: GraphRunRequest) -> GraphRun {
        let graph_id = match GraphId::parse(&request.graph_id) {
            Ok(id) => id,
            Err(e) => {
                warn!(run_id = %request.run_id, error = %e, "rejecting run");
                return GraphRun::failed(ErrorCode::InvalidRequest);
            }
        };

        let Some(provider) = self.providers.get(&graph_id.namespace) else {
            debug!(run_id = %request.run_id, namespace = %graph_id.namespace, "unknown provider namespace");
            return GraphRun::failed(ErrorCode::NotFound);
        };

        match &request.state_key {
            Some(state_key) => {
                request.thread_id = Some(derive_thread_id(&request.caller.tenant_id, state_key));
            }
            None if provider.requires_state() => {
                // Stateful providers never get anonymous state created for them.
                warn!(run_id = %request.run_id, provider = provider.provider_name(), "missing state key for stateful provider");
                return GraphRun::failed(ErrorCode::InvalidRequest);
            }
            None => {}
        }

        debug!(
            run_id = %request.run_id,
            graph = %graph_id,
            provider = provider.provider_name(),
            "dispatching run"
        );
        provider.run_graph(request)
    }
}

impl Default for GraphRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("provider namespace '{0}' is already registered")]
    DuplicateNamespace(String),
}
