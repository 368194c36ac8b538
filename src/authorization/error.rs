use thiserror::Error;

use super::{Action, SubjectKind};

/// AuthorizationDenied
///
/// The single failure of a policy check. `field` names the first field that
/// was not covered when a partial update was checked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot perform {action} on a {subject_kind}")]
pub struct AuthorizationDenied {
    pub action: Action,
    pub subject_kind: SubjectKind,
    pub field: Option<String>,
    pub reason: Option<String>,
}
