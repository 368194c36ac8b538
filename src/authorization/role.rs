use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role
///
/// Ordered from least to most privileged, so `Role::Moderator < Role::Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// Principal
///
/// Anything the ability builder can build rules for: an identity plus the
/// role set read once at the start of the request.
pub trait Principal {
    fn principal_id(&self) -> Uuid;

    fn roles(&self) -> &[Role];

    fn has_role(&self, role: Role) -> bool {
        self.roles().contains(&role)
    }

    /// The most privileged role held, `Role::User` when the set is empty.
    fn highest_role(&self) -> Role {
        self.roles().iter().copied().max().unwrap_or(Role::User)
    }
}
