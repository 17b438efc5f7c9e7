//! Profile and role models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Application role attached to a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Broker,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Broker => "broker",
            Self::Admin => "admin",
        }
    }

    /// Title shown at the top of the dashboard sidebar.
    pub fn portal_title(&self) -> &'static str {
        match self {
            Self::Client => "Client Portal",
            Self::Broker => "Broker Portal",
            Self::Admin => "Admin Portal",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Application-level record for a signed-in identity.
///
/// Provisioned externally, one row per identity, read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broker_license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broker_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broker_bio: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Profile {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self {
            id,
            role,
            first_name: None,
            last_name: None,
            phone: None,
            avatar_url: None,
            broker_license: None,
            broker_state: None,
            broker_bio: None,
            is_active: true,
        }
    }

    /// "First Last", skipping whichever part is missing.
    pub fn display_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Avatar initial: first letter of the first name, else the role's.
    pub fn initial(&self) -> char {
        self.first_name
            .as_deref()
            .and_then(|n| n.chars().next())
            .unwrap_or_else(|| {
                self.role
                    .as_str()
                    .chars()
                    .next()
                    .map(|c| c.to_ascii_uppercase())
                    .unwrap_or('?')
            })
    }
}

/// Who the current visitor is, as far as roles are concerned.
///
/// `Anonymous` covers both "signed out" and "signed in but no profile yet";
/// every role check is false for it.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    Anonymous,
    Identified(Profile),
}

impl Identity {
    pub fn role(&self) -> Option<Role> {
        match self {
            Self::Anonymous => None,
            Self::Identified(p) => Some(p.role),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role() == Some(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    pub fn is_broker(&self) -> bool {
        self.has_role(Role::Broker)
    }

    pub fn is_client(&self) -> bool {
        self.has_role(Role::Client)
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self {
            Self::Anonymous => None,
            Self::Identified(p) => Some(p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serde() {
        let admin: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(admin, Role::Admin);
        assert_eq!(serde_json::to_string(&Role::Broker).unwrap(), "\"broker\"");
        assert!(serde_json::from_str::<Role>("\"end_user\"").is_err());
    }

    #[test]
    fn profile_from_row_with_sparse_columns() {
        let id = Uuid::new_v4();
        let profile: Profile = serde_json::from_value(serde_json::json!({
            "id": id,
            "role": "broker",
            "first_name": "Dana",
            "created_at": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(profile.id, id);
        assert_eq!(profile.role, Role::Broker);
        assert!(profile.is_active);
        assert_eq!(profile.display_name(), "Dana");
    }

    #[test]
    fn initial_falls_back_to_role() {
        let mut profile = Profile::new(Uuid::new_v4(), Role::Admin);
        assert_eq!(profile.initial(), 'A');
        profile.first_name = Some("kim".to_string());
        assert_eq!(profile.initial(), 'k');
    }

    #[test]
    fn anonymous_has_no_role() {
        let anon = Identity::Anonymous;
        assert!(!anon.is_admin());
        assert!(!anon.is_broker());
        assert!(!anon.is_client());
        assert!(anon.profile().is_none());
    }

    #[test]
    fn role_predicates_are_exclusive() {
        for role in [Role::Client, Role::Broker, Role::Admin] {
            let identity = Identity::Identified(Profile::new(Uuid::new_v4(), role));
            let flags = [identity.is_client(), identity.is_broker(), identity.is_admin()];
            assert_eq!(flags.iter().filter(|f| **f).count(), 1, "{role}");
        }
    }

    #[test]
    fn portal_titles() {
        assert_eq!(Role::Admin.portal_title(), "Admin Portal");
        assert_eq!(Role::Broker.portal_title(), "Broker Portal");
        assert_eq!(Role::Client.portal_title(), "Client Portal");
    }
}
