//! Ability/policy engine.
//!
//! An [`AbilitySet`] is an ordered list of allow/forbid [`Rule`]s built fresh
//! for each request by [`AbilityFactory::create_for_user`]. Handlers call
//! [`AbilitySet::check`] with the action, the loaded subject and the fields
//! they are about to write before touching the repository.
//!
//! Evaluation walks the rules from the last declared to the first; the first
//! rule in scope whose condition holds decides. No decisive rule means deny.

mod ability;
mod action;
mod error;
mod factory;
mod role;
mod rule;
mod subject;

pub use ability::{AbilityBuilder, AbilitySet};
pub use action::Action;
pub use error::AuthorizationDenied;
pub use factory::AbilityFactory;
pub use role::{Principal, Role};
pub use rule::{Condition, Effect, Rule, SubjectScope};
pub use subject::{Subject, SubjectAttributes, SubjectKind};
