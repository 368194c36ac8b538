use serde::{Deserialize, Serialize};

/// Action
///
/// The verbs a rule can grant or forbid. `Manage` is a wildcard: a rule
/// declared for `Manage` applies to every other action as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Manage,
    Create,
    Read,
    Update,
    Delete,
    /// Voting and reacting on content.
    Interact,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Manage,
        Action::Create,
        Action::Read,
        Action::Update,
        Action::Delete,
        Action::Interact,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Manage => "manage",
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Interact => "interact",
        }
    }

    /// Whether a rule declared for `self` covers a request for `requested`.
    pub fn covers(self, requested: Action) -> bool {
        self == Action::Manage || self == requested
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "manage" => Ok(Action::Manage),
            "create" => Ok(Action::Create),
            "read" => Ok(Action::Read),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            "interact" => Ok(Action::Interact),
            _ => Err(()),
        }
    }
}
