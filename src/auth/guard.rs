//! Dashboard route guard and role-filtered navigation.

use serde::Serialize;

use super::model::{Profile, Role};
use super::state::{GateState, ProfileLookup};

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/login";

/// Outcome of guarding a dashboard page.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision {
    /// Session or profile still being resolved; render a spinner.
    Loading,
    RedirectToLogin,
    /// Signed in, but the profile could not be read. The page shows a
    /// retry prompt instead of waiting forever.
    ProfileUnavailable,
    /// Signed in with a role that may not see this page.
    Forbidden { role: Role },
    Allow(Profile),
}

/// Decide what a dashboard page may render. An empty `allowed` slice
/// admits every role.
pub fn guard_dashboard(state: &GateState, allowed: &[Role]) -> GuardDecision {
    match state {
        GateState::Initializing => GuardDecision::Loading,
        GateState::Unauthenticated => GuardDecision::RedirectToLogin,
        GateState::AuthenticatedNoProfile { lookup, .. } => match lookup {
            ProfileLookup::Pending => GuardDecision::Loading,
            ProfileLookup::Failed => GuardDecision::ProfileUnavailable,
        },
        GateState::AuthenticatedWithProfile { profile, .. } => {
            if allowed.is_empty() || allowed.contains(&profile.role) {
                GuardDecision::Allow(profile.clone())
            } else {
                GuardDecision::Forbidden { role: profile.role }
            }
        }
    }
}

/// One sidebar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub name: &'static str,
    pub href: &'static str,
    pub roles: &'static [Role],
}

const ALL: &[Role] = &[Role::Admin, Role::Broker, Role::Client];
const STAFF: &[Role] = &[Role::Admin, Role::Broker];
const ADMIN: &[Role] = &[Role::Admin];

/// Dashboard sidebar, in display order.
pub const NAVIGATION: &[NavItem] = &[
    NavItem { name: "Dashboard", href: "/dashboard", roles: ALL },
    NavItem { name: "Properties", href: "/dashboard/properties", roles: STAFF },
    NavItem { name: "Clients", href: "/dashboard/clients", roles: STAFF },
    NavItem { name: "Events Log", href: "/dashboard/events", roles: ADMIN },
    NavItem { name: "Reports", href: "/dashboard/reports", roles: STAFF },
    NavItem { name: "Settings", href: "/dashboard/settings", roles: ALL },
];

/// Roles allowed to manage property listings.
pub const LISTING_ROLES: &[Role] = STAFF;

/// A sidebar entry as rendered for one visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub name: &'static str,
    pub href: &'static str,
    pub active: bool,
}

/// Sidebar entries visible to `role`, with the active one marked.
pub fn navigation_for(role: Role, current_path: &str) -> Vec<NavLink> {
    NAVIGATION
        .iter()
        .filter(|item| item.roles.contains(&role))
        .map(|item| NavLink {
            name: item.name,
            href: item.href,
            active: is_active(item.href, current_path),
        })
        .collect()
}

/// Exact match, or `href` followed by a `/` segment boundary.
pub fn is_active(href: &str, current_path: &str) -> bool {
    current_path == href
        || current_path
            .strip_prefix(href)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use secrecy::SecretString;
    use uuid::Uuid;

    use super::*;
    use crate::backend::{Session, SessionUser};

    fn session(id: Uuid) -> Session {
        Session {
            access_token: SecretString::from("t"),
            refresh_token: None,
            expires_at: Utc::now(),
            user: SessionUser { id, email: None },
        }
    }

    fn with_role(role: Role) -> GateState {
        let id = Uuid::new_v4();
        GateState::AuthenticatedWithProfile {
            session: session(id),
            profile: Profile::new(id, role),
        }
    }

    #[test]
    fn unauthenticated_redirects() {
        assert_eq!(
            guard_dashboard(&GateState::Unauthenticated, &[]),
            GuardDecision::RedirectToLogin
        );
    }

    #[test]
    fn initializing_and_pending_are_loading() {
        assert_eq!(guard_dashboard(&GateState::Initializing, &[]), GuardDecision::Loading);
        let pending = GateState::AuthenticatedNoProfile {
            session: session(Uuid::new_v4()),
            lookup: ProfileLookup::Pending,
        };
        assert_eq!(guard_dashboard(&pending, &[]), GuardDecision::Loading);
    }

    #[test]
    fn failed_lookup_is_not_loading_forever() {
        let failed = GateState::AuthenticatedNoProfile {
            session: session(Uuid::new_v4()),
            lookup: ProfileLookup::Failed,
        };
        assert_eq!(guard_dashboard(&failed, STAFF), GuardDecision::ProfileUnavailable);
    }

    #[test]
    fn role_restriction() {
        assert!(matches!(
            guard_dashboard(&with_role(Role::Broker), LISTING_ROLES),
            GuardDecision::Allow(_)
        ));
        assert_eq!(
            guard_dashboard(&with_role(Role::Client), LISTING_ROLES),
            GuardDecision::Forbidden { role: Role::Client }
        );
        assert!(matches!(
            guard_dashboard(&with_role(Role::Client), &[]),
            GuardDecision::Allow(_)
        ));
    }

    #[test]
    fn navigation_by_role() {
        let names = |role| {
            navigation_for(role, "/dashboard")
                .into_iter()
                .map(|l| l.name)
                .collect::<Vec<_>>()
        };
        assert_eq!(names(Role::Client), vec!["Dashboard", "Settings"]);
        assert_eq!(
            names(Role::Broker),
            vec!["Dashboard", "Properties", "Clients", "Reports", "Settings"]
        );
        assert_eq!(names(Role::Admin).len(), 6);
    }

    #[test]
    fn active_link_matching() {
        assert!(is_active("/dashboard/properties", "/dashboard/properties"));
        assert!(is_active("/dashboard/properties", "/dashboard/properties/42/edit"));
        assert!(!is_active("/dashboard/properties", "/dashboard/properties-archive"));
        assert!(!is_active("/dashboard/clients", "/dashboard"));

        let links = navigation_for(Role::Admin, "/dashboard/events");
        let active: Vec<_> = links.iter().filter(|l| l.active).map(|l| l.name).collect();
        assert_eq!(active, vec!["Events Log"]);
    }
}
