//! Session/role gate.
//!
//! Tracks whether each operator is signed in, resolves their profile row,
//! and answers role questions for the dashboard. Profile lookups never
//! crash the application; callers decide how to degrade.

pub mod gate;
pub mod guard;
pub mod model;
pub mod sessions;
pub mod state;

pub use gate::{GateHandle, GateSnapshot, SessionGate};
pub use guard::{GuardDecision, NavLink, guard_dashboard, navigation_for};
pub use model::{Identity, Profile, Role};
pub use sessions::{BackendFactory, Caller, SessionRegistry};
pub use state::{GatePhase, GateState, ProfileLookup};
