use tracing::instrument;

use super::{
    AbilityBuilder, AbilitySet, Action, Condition, Principal, Role, SubjectKind, SubjectScope,
};

const NOT_THE_AUTHOR: &str = "Not the author";
const POST_LOCKED: &str = "Post is locked";
const CONTENT_HIDDEN: &str = "Content is hidden";

/// AbilityFactory
///
/// Builds the per-request rule set for a principal. Building never fails: the
/// worst case is a rule set that only grants reads.
pub struct AbilityFactory;

impl AbilityFactory {
    #[instrument(level = "debug", skip(user), fields(user_id = %user.principal_id(), role = %user.highest_role()))]
    pub fn create_for_user<P: Principal + ?Sized>(user: &P) -> AbilitySet {
        let mut builder = AbilityBuilder::new(Some(user.principal_id()));

        if user.has_role(Role::Admin) {
            builder.allow([Action::Manage], SubjectScope::All);
        } else {
            Self::member_rules(&mut builder);

            if user.has_role(Role::Moderator) {
                Self::moderator_rules(&mut builder);
            } else {
                Self::author_rules(&mut builder);
                Self::content_state_rules(&mut builder);
            }
        }

        Self::global_rules(&mut builder);

        let ability = builder.build();
        tracing::debug!(rules = ability.rules().len(), "ability built");
        ability
    }

    /// Rules for an unauthenticated visitor: visible content is readable,
    /// nothing else.
    pub fn create_for_guest() -> AbilitySet {
        let mut builder = AbilityBuilder::new(None);
        builder.allow([Action::Read], SubjectScope::All);
        builder
            .forbid([Action::Read], SubjectKind::CONTENT)
            .when(Condition::Hidden)
            .because(CONTENT_HIDDEN);
        builder.build()
    }

    /// Visibility gate used by listing queries to decide whether hidden
    /// content is filtered out up front.
    pub fn can_see_hidden_content<P: Principal + ?Sized>(user: &P) -> bool {
        user.has_role(Role::Moderator) || user.has_role(Role::Admin)
    }

    fn member_rules(builder: &mut AbilityBuilder) {
        builder.allow([Action::Read], SubjectScope::All);
        builder.allow(
            [Action::Create],
            [
                SubjectKind::Comment,
                SubjectKind::Post,
                SubjectKind::Reply,
                SubjectKind::Tag,
                SubjectKind::StudyDoc,
                SubjectKind::Thread,
            ],
        );
        builder.allow(
            [Action::Interact],
            [SubjectKind::Comment, SubjectKind::Post, SubjectKind::Reply],
        );
    }

    fn moderator_rules(builder: &mut AbilityBuilder) {
        builder.allow([Action::Update], SubjectScope::All);
        builder.allow(
            [Action::Manage],
            [
                SubjectKind::Subject,
                SubjectKind::Tag,
                SubjectKind::Article,
                SubjectKind::StudyDoc,
            ],
        );
        builder
            .forbid([Action::Create, Action::Update, Action::Delete], SubjectKind::Badge)
            .because("Badges are managed by administrators");
    }

    fn author_rules(builder: &mut AbilityBuilder) {
        builder
            .allow([Action::Update], SubjectKind::Thread)
            .fields(&["title", "tags", "type", "opened", "solved", "assignees"])
            .when(Condition::Owned)
            .because(NOT_THE_AUTHOR);
        builder
            .allow([Action::Update], SubjectKind::Post)
            .fields(&["body"])
            .when(Condition::Owned)
            .because(NOT_THE_AUTHOR);
        builder
            .allow([Action::Update], SubjectKind::Comment)
            .fields(&["body"])
            .when(Condition::Owned)
            .because(NOT_THE_AUTHOR);
        builder
            .allow([Action::Update], SubjectKind::Reply)
            .fields(&["body"])
            .when(Condition::Owned)
            .because(NOT_THE_AUTHOR);
        builder
            .allow([Action::Update], SubjectKind::StudyDoc)
            .fields(&["description", "doc_series", "name", "subject", "tags", "year"])
            .when(Condition::Owned)
            .because(NOT_THE_AUTHOR);

        builder
            .allow(
                [Action::Delete],
                [
                    SubjectKind::Thread,
                    SubjectKind::Comment,
                    SubjectKind::Reply,
                    SubjectKind::StudyDoc,
                ],
            )
            .when(Condition::Owned)
            .because(NOT_THE_AUTHOR);
    }

    fn content_state_rules(builder: &mut AbilityBuilder) {
        builder
            .forbid(
                [Action::Update, Action::Delete, Action::Interact],
                [SubjectKind::Thread, SubjectKind::Post],
            )
            .when(Condition::Locked)
            .because(POST_LOCKED);
        builder
            .forbid(
                [Action::Create, Action::Update, Action::Delete, Action::Interact],
                [SubjectKind::Comment, SubjectKind::Reply],
            )
            .when(Condition::ParentLocked)
            .because(POST_LOCKED);
        builder
            .forbid(
                [Action::Read, Action::Update, Action::Delete, Action::Interact],
                SubjectKind::CONTENT,
            )
            .when(Condition::Hidden)
            .because(CONTENT_HIDDEN);
    }

    /// Applied to every role, admins included, after the role rules.
    fn global_rules(builder: &mut AbilityBuilder) {
        builder
            .allow([Action::Update], SubjectKind::User)
            .when(Condition::Owned);
        builder
            .forbid([Action::Update], SubjectKind::User)
            .when(Condition::NotOwned)
            .because("Cannot update another user's profile");
        builder
            .forbid([Action::Delete], SubjectKind::Post)
            .because("Posts are deleted through their thread");
    }
}
