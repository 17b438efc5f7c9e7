//! Gate state machine: what the gate currently knows about the visitor.

use serde::Serialize;
use uuid::Uuid;

use super::model::{Identity, Profile};
use crate::backend::Session;

/// Progress of the profile lookup for an authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileLookup {
    Pending,
    Failed,
}

/// States of the session gate.
///
/// Initializing → Unauthenticated | AuthenticatedNoProfile →
/// AuthenticatedWithProfile. Sign-out returns to Unauthenticated from
/// anywhere; there is no terminal state.
#[derive(Debug, Clone)]
pub enum GateState {
    Initializing,
    Unauthenticated,
    AuthenticatedNoProfile {
        session: Session,
        lookup: ProfileLookup,
    },
    AuthenticatedWithProfile {
        session: Session,
        profile: Profile,
    },
}

/// Serializable phase name, without session details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GatePhase {
    Initializing,
    Unauthenticated,
    AuthenticatedNoProfile,
    AuthenticatedWithProfile,
}

impl std::fmt::Display for GatePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Initializing => "initializing",
            Self::Unauthenticated => "unauthenticated",
            Self::AuthenticatedNoProfile => "authenticated_no_profile",
            Self::AuthenticatedWithProfile => "authenticated_with_profile",
        };
        write!(f, "{s}")
    }
}

impl Default for GateState {
    fn default() -> Self {
        Self::Initializing
    }
}

impl GateState {
    pub fn phase(&self) -> GatePhase {
        match self {
            Self::Initializing => GatePhase::Initializing,
            Self::Unauthenticated => GatePhase::Unauthenticated,
            Self::AuthenticatedNoProfile { .. } => GatePhase::AuthenticatedNoProfile,
            Self::AuthenticatedWithProfile { .. } => GatePhase::AuthenticatedWithProfile,
        }
    }

    /// True until the gate knows both the session and the profile outcome.
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            Self::Initializing
                | Self::AuthenticatedNoProfile {
                    lookup: ProfileLookup::Pending,
                    ..
                }
        )
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::AuthenticatedNoProfile { session, .. }
            | Self::AuthenticatedWithProfile { session, .. } => Some(session),
            Self::Initializing | Self::Unauthenticated => None,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.session().map(Session::user_id)
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self {
            Self::AuthenticatedWithProfile { profile, .. } => Some(profile),
            _ => None,
        }
    }

    pub fn identity(&self) -> Identity {
        match self.profile() {
            Some(p) => Identity::Identified(p.clone()),
            None => Identity::Anonymous,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }
}
