use serde::{Deserialize, Serialize};

/// Ambient identity of the caller a run executes on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// Tenant the run is isolated under. Never handed to external providers
    /// directly; stateful providers see only ids derived from it.
    pub tenant_id: String,
    /// End user or service principal within the tenant.
    pub caller_id: String,
}

impl CallerIdentity {
    pub fn new(tenant_id: impl Into<String>, caller_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            caller_id: caller_id.into(),
        }
    }
}
