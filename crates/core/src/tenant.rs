//! Tenant-scoped thread id derivation.
//!
//! Stateful providers are addressed with an externally visible thread id
//! instead of the caller's raw `state_key`. The id is a pure function of
//! `(tenant_id, state_key)`: nothing is stored, and the same inputs produce
//! the same id across calls and processes.

use uuid::Uuid;

/// Fixed root namespace for thread derivation. Changing this value re-keys
/// every derived thread id in the deployment.
const THREAD_NAMESPACE: Uuid = Uuid::from_u128(0x8e1d_9f4a_a7b3_41c2_b6d0_534f_de7a_9c11);

/// Derive the thread id for `(tenant_id, state_key)`.
///
/// Two-level UUIDv5: the root namespace hashes the tenant id into a
/// per-tenant namespace, which then hashes the state key. Each level hashes
/// exactly one opaque string, so no choice of `state_key` can collide with
/// another tenant's threads. The result reveals neither input.
pub fn derive_thread_id(tenant_id: &str, state_key: &str) -> Uuid {
    let tenant_ns = Uuid::new_v5(&THREAD_NAMESPACE, tenant_id.as_bytes());
    Uuid::new_v5(&tenant_ns, state_key.as_bytes())
}
