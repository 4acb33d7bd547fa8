//! Authentication and authorization module
//!
//! Provides login, bearer tokens, session/bearer identity resolution,
//! role-based access control, and privileged impersonation.

mod attempts;
mod identity;
mod impersonation;
mod password;
mod token;

pub use attempts::LoginAttemptTracker;
pub use identity::{require_any_role, resolve_identity, Identity, SESSION_COOKIE};
pub use impersonation::impersonate;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenIssuer, TokenKind};

use crate::error::AppError;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User roles for authorization
///
/// A closed set known at build time. Wire form is the legacy
/// SCREAMING_SNAKE string (`WEBSITE_ADMIN`, `INDIV_AGENT`, ...); parsing
/// is case-insensitive, serialization always canonical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Platform administrator: full access, may impersonate
    WebsiteAdmin,
    /// Owner of a brokerage organization
    OrgOwner,
    /// Agent belonging to an organization
    OrgAgent,
    /// Independent agent without an organization
    IndivAgent,
    /// Property seller
    Seller,
    /// Property buyer
    Buyer,
}

impl Role {
    pub fn can_impersonate(&self) -> bool {
        matches!(self, Role::WebsiteAdmin)
    }

    pub fn can_manage_users(&self) -> bool {
        matches!(self, Role::WebsiteAdmin)
    }

    pub fn can_view_audit_log(&self) -> bool {
        matches!(self, Role::WebsiteAdmin)
    }

    pub fn can_publish_listings(&self) -> bool {
        matches!(
            self,
            Role::WebsiteAdmin | Role::OrgOwner | Role::OrgAgent | Role::IndivAgent
        )
    }

    fn as_str(&self) -> &'static str {
        match self {
            Role::WebsiteAdmin => "WEBSITE_ADMIN",
            Role::OrgOwner => "ORG_OWNER",
            Role::OrgAgent => "ORG_AGENT",
            Role::IndivAgent => "INDIV_AGENT",
            Role::Seller => "SELLER",
            Role::Buyer => "BUYER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WEBSITE_ADMIN" => Ok(Role::WebsiteAdmin),
            "ORG_OWNER" => Ok(Role::OrgOwner),
            "ORG_AGENT" => Ok(Role::OrgAgent),
            "INDIV_AGENT" => Ok(Role::IndivAgent),
            "SELLER" => Ok(Role::Seller),
            "BUYER" => Ok(Role::Buyer),
            other => Err(AppError::Validation(format!("Unknown role: {}", other))),
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// A deduplicated, ordered set of roles
///
/// The single normalization point for role data: legacy payloads encode
/// roles either as a JSON array of strings or as one comma-separated
/// string, and with inconsistent casing. Both forms deserialize here;
/// unknown role names are rejected, never silently admitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleSet(Vec<Role>);

impl RoleSet {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        let mut roles: Vec<Role> = roles.into_iter().collect();
        roles.sort();
        roles.dedup();
        RoleSet(roles)
    }

    pub fn single(role: Role) -> Self {
        RoleSet(vec![role])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Admission test: true when this set shares at least one role
    /// with `required`.
    pub fn intersects(&self, required: &RoleSet) -> bool {
        self.0.iter().any(|r| required.contains(*r))
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }
}

impl FromStr for RoleSet {
    type Err = AppError;

    /// Parse a comma-separated legacy role string, e.g. `"seller, BUYER"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let roles = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Role::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RoleSet::new(roles))
    }
}

impl<'de> Deserialize<'de> for RoleSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Many(Vec<String>),
            One(String),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Many(items) => {
                let roles = items
                    .iter()
                    .map(|s| Role::from_str(s))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(de::Error::custom)?;
                Ok(RoleSet::new(roles))
            }
            Wire::One(s) => s.parse().map_err(de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_case_insensitive() {
        assert_eq!("website_admin".parse::<Role>().unwrap(), Role::WebsiteAdmin);
        assert_eq!("INDIV_AGENT".parse::<Role>().unwrap(), Role::IndivAgent);
        assert_eq!(" buyer ".parse::<Role>().unwrap(), Role::Buyer);
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!("SUPER_USER".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_display_is_canonical() {
        assert_eq!(Role::WebsiteAdmin.to_string(), "WEBSITE_ADMIN");
        assert_eq!(Role::OrgAgent.to_string(), "ORG_AGENT");
    }

    #[test]
    fn test_roleset_deduplicates() {
        let set = RoleSet::new([Role::Buyer, Role::Seller, Role::Buyer]);
        assert_eq!(set.iter().count(), 2);
    }

    #[test]
    fn test_roleset_from_json_array() {
        let set: RoleSet = serde_json::from_str(r#"["WEBSITE_ADMIN", "buyer"]"#).unwrap();
        assert!(set.contains(Role::WebsiteAdmin));
        assert!(set.contains(Role::Buyer));
    }

    #[test]
    fn test_roleset_from_legacy_string() {
        let set: RoleSet = serde_json::from_str(r#""seller,ORG_AGENT""#).unwrap();
        assert!(set.contains(Role::Seller));
        assert!(set.contains(Role::OrgAgent));
    }

    #[test]
    fn test_roleset_rejects_unknown_member() {
        let result: Result<RoleSet, _> = serde_json::from_str(r#"["BUYER", "WIZARD"]"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_roleset_serializes_as_array() {
        let set = RoleSet::new([Role::IndivAgent]);
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["INDIV_AGENT"]"#);
    }

    #[test]
    fn test_intersects() {
        let mine = RoleSet::new([Role::Buyer]);
        let admin_only = RoleSet::single(Role::WebsiteAdmin);
        let anyone = RoleSet::new([Role::Buyer, Role::Seller]);
        assert!(!mine.intersects(&admin_only));
        assert!(mine.intersects(&anyone));
    }

    #[test]
    fn test_permission_mapping_is_fixed() {
        assert!(Role::WebsiteAdmin.can_impersonate());
        assert!(!Role::OrgOwner.can_impersonate());
        assert!(Role::IndivAgent.can_publish_listings());
        assert!(!Role::Buyer.can_publish_listings());
    }
}
