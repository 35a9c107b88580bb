//! User roles and the role -> landing-path mapping.
//!
//! Role strings must match the backend's role enum exactly; the landing
//! paths are the views the router falls back to after login or a denied
//! navigation.

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

pub const ROLE_PARENT: &str = "parent";
pub const ROLE_TEACHER: &str = "teacher";
pub const ROLE_YOUNGER_CHILD: &str = "younger_child";
pub const ROLE_OLDER_CHILD: &str = "older_child";

/// All valid role strings.
pub const VALID_ROLES: &[&str] = &[
    ROLE_PARENT,
    ROLE_TEACHER,
    ROLE_YOUNGER_CHILD,
    ROLE_OLDER_CHILD,
];

/// Landing view per role.
pub const CHILD_DASHBOARD_PATH: &str = "/child/dashboard";
pub const TEEN_DASHBOARD_PATH: &str = "/teen/dashboard";
pub const PARENT_DASHBOARD_PATH: &str = "/parent/dashboard";
pub const TEACHER_DASHBOARD_PATH: &str = "/teacher/dashboard";

/// Fallback for sessions with no (known) role.
pub const ROOT_PATH: &str = "/";

/// Where unauthenticated navigation attempts are sent.
pub const LOGIN_PATH: &str = "/login";

/// The four user roles of the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Parent,
    Teacher,
    YoungerChild,
    OlderChild,
}

impl Role {
    /// Parse a backend role string.
    pub fn from_str_value(s: &str) -> Result<Self, ClientError> {
        match s {
            ROLE_PARENT => Ok(Self::Parent),
            ROLE_TEACHER => Ok(Self::Teacher),
            ROLE_YOUNGER_CHILD => Ok(Self::YoungerChild),
            ROLE_OLDER_CHILD => Ok(Self::OlderChild),
            _ => Err(ClientError::Validation(format!(
                "Invalid role '{s}'. Must be one of: {}",
                VALID_ROLES.join(", ")
            ))),
        }
    }

    /// The backend string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parent => ROLE_PARENT,
            Self::Teacher => ROLE_TEACHER,
            Self::YoungerChild => ROLE_YOUNGER_CHILD,
            Self::OlderChild => ROLE_OLDER_CHILD,
        }
    }

    /// The dashboard this role lands on after login.
    pub fn landing_path(&self) -> &'static str {
        match self {
            Self::Parent => PARENT_DASHBOARD_PATH,
            Self::Teacher => TEACHER_DASHBOARD_PATH,
            Self::YoungerChild => CHILD_DASHBOARD_PATH,
            Self::OlderChild => TEEN_DASHBOARD_PATH,
        }
    }

    /// Both child roles.
    pub fn is_child(&self) -> bool {
        matches!(self, Self::YoungerChild | Self::OlderChild)
    }

    /// The older-child ("teen") role.
    pub fn is_teen(&self) -> bool {
        matches!(self, Self::OlderChild)
    }
}

/// Landing path for an optional role; sessions with no known role land on
/// the root view.
pub fn landing_path_for(role: Option<Role>) -> &'static str {
    role.map_or(ROOT_PATH, |r| r.landing_path())
}
