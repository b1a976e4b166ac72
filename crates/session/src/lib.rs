//! The Session Registry (spec.md §4.C).
//!
//! Tracks every live session and the connection it currently rides on.
//! Lookups happen on every inbound frame, so both the forward map
//! (session → session state) and the reverse index (connection →
//! session) are lock-free [`dashmap::DashMap`]s rather than a single
//! `RwLock<HashMap<_>>` guarding both, mirroring the teacher's
//! `SessionManager` but swapping its single coarse lock for per-shard
//! concurrent maps sized to the gateway's per-frame lookup pattern.

mod registry;
mod session;

pub use registry::{RegistryError, SessionRegistry};
pub use session::{Session, SessionMetadata, SessionState};
