use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Action, SubjectAttributes, SubjectKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Allow,
    Forbid,
}

impl Effect {
    pub fn as_str(self) -> &'static str {
        match self {
            Effect::Allow => "allow",
            Effect::Forbid => "forbid",
        }
    }
}

/// SubjectScope
///
/// Which subject kinds a rule targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectScope {
    All,
    Kinds(Vec<SubjectKind>),
}

impl SubjectScope {
    pub fn contains(&self, kind: SubjectKind) -> bool {
        match self {
            SubjectScope::All => true,
            SubjectScope::Kinds(kinds) => kinds.contains(&kind),
        }
    }
}

impl From<SubjectKind> for SubjectScope {
    fn from(kind: SubjectKind) -> Self {
        SubjectScope::Kinds(vec![kind])
    }
}

impl<const N: usize> From<[SubjectKind; N]> for SubjectScope {
    fn from(kinds: [SubjectKind; N]) -> Self {
        SubjectScope::Kinds(kinds.to_vec())
    }
}

/// Condition
///
/// Predicate over a subject and the requester. A closed set keeps rules plain
/// data: they can be compared, serialized and shipped to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// The subject's owner is the requester.
    Owned,
    /// The subject has an owner and it is not the requester.
    NotOwned,
    Locked,
    ParentLocked,
    Hidden,
}

impl Condition {
    pub fn as_str(self) -> &'static str {
        match self {
            Condition::Owned => "owned",
            Condition::NotOwned => "not_owned",
            Condition::Locked => "locked",
            Condition::ParentLocked => "parent_locked",
            Condition::Hidden => "hidden",
        }
    }

    pub fn holds(self, subject: &SubjectAttributes, requester: Option<Uuid>) -> bool {
        match self {
            Condition::Owned => requester.is_some() && subject.owner_id == requester,
            Condition::NotOwned => subject.owner_id.is_some() && subject.owner_id != requester,
            Condition::Locked => subject.locked,
            Condition::ParentLocked => subject.parent_locked,
            Condition::Hidden => !subject.visible,
        }
    }
}

/// Rule
///
/// One allow/forbid declaration. Rules only decide when their action, subject
/// scope and field list match and their condition (if any) holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub effect: Effect,
    pub actions: Vec<Action>,
    pub subjects: SubjectScope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Rule {
    pub fn new(
        effect: Effect,
        actions: impl IntoIterator<Item = Action>,
        subjects: impl Into<SubjectScope>,
    ) -> Self {
        Self {
            effect,
            actions: actions.into_iter().collect(),
            subjects: subjects.into(),
            fields: None,
            condition: None,
            reason: None,
        }
    }

    /// Restrict the rule to the listed fields.
    pub fn fields(&mut self, fields: &[&str]) -> &mut Self {
        self.fields = Some(fields.iter().map(|field| field.to_string()).collect());
        self
    }

    pub fn when(&mut self, condition: Condition) -> &mut Self {
        self.condition = Some(condition);
        self
    }

    pub fn because(&mut self, reason: impl Into<String>) -> &mut Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn is_forbid(&self) -> bool {
        self.effect == Effect::Forbid
    }

    /// Whether the rule is in scope for the request, ignoring its condition.
    ///
    /// A rule with a field list matches a requested field only if it lists
    /// it. With no requested field, allow rules with field lists still match
    /// (the subject is partially accessible) but forbid rules do not.
    pub fn matches(&self, action: Action, kind: SubjectKind, field: Option<&str>) -> bool {
        if !self.actions.iter().any(|declared| declared.covers(action)) {
            return false;
        }
        if !self.subjects.contains(kind) {
            return false;
        }
        match (&self.fields, field) {
            (None, _) => true,
            (Some(fields), Some(field)) => fields.iter().any(|listed| listed == field),
            (Some(_), None) => !self.is_forbid(),
        }
    }

    pub fn condition_holds(&self, subject: &SubjectAttributes, requester: Option<Uuid>) -> bool {
        self.condition
            .is_none_or(|condition| condition.holds(subject, requester))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_by(owner: Uuid) -> SubjectAttributes {
        SubjectAttributes::of_kind(SubjectKind::Post).owned_by(owner)
    }

    #[test]
    fn manage_rule_matches_any_action_on_scoped_kinds() {
        let rule = Rule::new(Effect::Allow, [Action::Manage], [SubjectKind::Tag]);
        assert!(rule.matches(Action::Delete, SubjectKind::Tag, None));
        assert!(!rule.matches(Action::Delete, SubjectKind::Badge, None));
    }

    #[test]
    fn field_lists_only_match_listed_fields() {
        let mut rule = Rule::new(Effect::Allow, [Action::Update], SubjectKind::Post);
        rule.fields(&["body"]);
        assert!(rule.matches(Action::Update, SubjectKind::Post, Some("body")));
        assert!(!rule.matches(Action::Update, SubjectKind::Post, Some("locked")));
        assert!(rule.matches(Action::Update, SubjectKind::Post, None));
    }

    #[test]
    fn forbid_with_fields_ignores_fieldless_requests() {
        let mut rule = Rule::new(Effect::Forbid, [Action::Update], SubjectKind::Post);
        rule.fields(&["locked"]);
        assert!(!rule.matches(Action::Update, SubjectKind::Post, None));
        assert!(rule.matches(Action::Update, SubjectKind::Post, Some("locked")));
    }

    #[test]
    fn ownership_conditions_compare_against_requester() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(Condition::Owned.holds(&post_by(me), Some(me)));
        assert!(!Condition::Owned.holds(&post_by(other), Some(me)));
        assert!(!Condition::Owned.holds(&post_by(me), None));

        assert!(Condition::NotOwned.holds(&post_by(other), Some(me)));
        assert!(!Condition::NotOwned.holds(&post_by(me), Some(me)));
        assert!(!Condition::NotOwned.holds(
            &SubjectAttributes::of_kind(SubjectKind::Tag),
            Some(me)
        ));
    }

    #[test]
    fn state_conditions_read_flags() {
        let attrs = SubjectAttributes::of_kind(SubjectKind::Comment)
            .parent_locked(true)
            .visible(false);
        assert!(Condition::ParentLocked.holds(&attrs, None));
        assert!(Condition::Hidden.holds(&attrs, None));
        assert!(!Condition::Locked.holds(&attrs, None));
    }
}
