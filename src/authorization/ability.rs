use uuid::Uuid;

use super::{Action, AuthorizationDenied, Effect, Rule, Subject, SubjectAttributes, SubjectScope};

/// AbilityBuilder
///
/// Accumulates rules in declaration order. Later rules take precedence over
/// earlier ones, so broad grants go first and narrowing forbids after.
#[derive(Debug)]
pub struct AbilityBuilder {
    requester: Option<Uuid>,
    rules: Vec<Rule>,
}

impl AbilityBuilder {
    pub fn new(requester: Option<Uuid>) -> Self {
        Self {
            requester,
            rules: Vec::new(),
        }
    }

    pub fn allow(
        &mut self,
        actions: impl IntoIterator<Item = Action>,
        subjects: impl Into<SubjectScope>,
    ) -> &mut Rule {
        self.push(Rule::new(Effect::Allow, actions, subjects))
    }

    pub fn forbid(
        &mut self,
        actions: impl IntoIterator<Item = Action>,
        subjects: impl Into<SubjectScope>,
    ) -> &mut Rule {
        self.push(Rule::new(Effect::Forbid, actions, subjects))
    }

    fn push(&mut self, rule: Rule) -> &mut Rule {
        let index = self.rules.len();
        self.rules.push(rule);
        &mut self.rules[index]
    }

    pub fn build(self) -> AbilitySet {
        AbilitySet {
            requester: self.requester,
            rules: self.rules,
        }
    }
}

/// Outcome of evaluating a single (action, subject, field) triple.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Decision {
    Allowed,
    Denied(Option<String>),
}

/// AbilitySet
///
/// The immutable, request-scoped rule set for one requester.
#[derive(Debug, Clone)]
pub struct AbilitySet {
    requester: Option<Uuid>,
    rules: Vec<Rule>,
}

impl AbilitySet {
    pub fn requester(&self) -> Option<Uuid> {
        self.requester
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// can
    ///
    /// Boolean form of the policy check for a single (optional) field.
    pub fn can<S: Subject + ?Sized>(&self, action: Action, subject: &S, field: Option<&str>) -> bool {
        let attrs = subject.attributes();
        self.decide(action, &attrs, field) == Decision::Allowed
    }

    /// check
    ///
    /// Passes silently or fails with `AuthorizationDenied`. With a non-empty
    /// field list every field must be covered; the first uncovered one fails
    /// the whole check, so partial updates never half-succeed.
    pub fn check<S: Subject + ?Sized>(
        &self,
        action: Action,
        subject: &S,
        fields: &[&str],
    ) -> Result<(), AuthorizationDenied> {
        let attrs = subject.attributes();

        if fields.is_empty() {
            return match self.decide(action, &attrs, None) {
                Decision::Allowed => Ok(()),
                Decision::Denied(reason) => Err(self.denied(action, &attrs, None, reason)),
            };
        }

        for &field in fields {
            if let Decision::Denied(reason) = self.decide(action, &attrs, Some(field)) {
                return Err(self.denied(action, &attrs, Some(field), reason));
            }
        }
        Ok(())
    }

    /// Scan from the last declared rule backwards; the first in-scope rule
    /// whose condition holds decides. Nothing decisive means deny, carrying
    /// the reason of the latest in-scope allow rule that did not apply.
    fn decide(&self, action: Action, attrs: &SubjectAttributes, field: Option<&str>) -> Decision {
        let mut unmet_reason = None;

        for rule in self.rules.iter().rev() {
            if !rule.matches(action, attrs.kind, field) {
                continue;
            }
            if !rule.condition_holds(attrs, self.requester) {
                if !rule.is_forbid() && unmet_reason.is_none() {
                    unmet_reason = rule.reason.clone();
                }
                continue;
            }
            return match rule.effect {
                Effect::Allow => Decision::Allowed,
                Effect::Forbid => Decision::Denied(rule.reason.clone()),
            };
        }

        Decision::Denied(unmet_reason)
    }

    fn denied(
        &self,
        action: Action,
        attrs: &SubjectAttributes,
        field: Option<&str>,
        reason: Option<String>,
    ) -> AuthorizationDenied {
        AuthorizationDenied {
            action,
            subject_kind: attrs.kind,
            field: field.map(str::to_string),
            reason,
        }
    }
}
