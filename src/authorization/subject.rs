use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// SubjectKind
///
/// Explicit discriminator for every entity an action can target. Rules are
/// scoped by kind, never by inspecting the concrete Rust type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Article,
    Badge,
    Blog,
    Club,
    Comment,
    Post,
    Reply,
    StudyDoc,
    /// An academic subject (course) study documents are filed under.
    Subject,
    Tag,
    Team,
    Thread,
    User,
}

impl SubjectKind {
    pub const ALL: [SubjectKind; 13] = [
        SubjectKind::Article,
        SubjectKind::Badge,
        SubjectKind::Blog,
        SubjectKind::Club,
        SubjectKind::Comment,
        SubjectKind::Post,
        SubjectKind::Reply,
        SubjectKind::StudyDoc,
        SubjectKind::Subject,
        SubjectKind::Tag,
        SubjectKind::Team,
        SubjectKind::Thread,
        SubjectKind::User,
    ];

    /// User-generated content that can be hidden, locked and voted on.
    pub const CONTENT: [SubjectKind; 5] = [
        SubjectKind::Thread,
        SubjectKind::Post,
        SubjectKind::Comment,
        SubjectKind::Reply,
        SubjectKind::Blog,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SubjectKind::Article => "article",
            SubjectKind::Badge => "badge",
            SubjectKind::Blog => "blog",
            SubjectKind::Club => "club",
            SubjectKind::Comment => "comment",
            SubjectKind::Post => "post",
            SubjectKind::Reply => "reply",
            SubjectKind::StudyDoc => "study_doc",
            SubjectKind::Subject => "subject",
            SubjectKind::Tag => "tag",
            SubjectKind::Team => "team",
            SubjectKind::Thread => "thread",
            SubjectKind::User => "user",
        }
    }
}

impl std::fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubjectKind {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SubjectKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or(())
    }
}

/// SubjectAttributes
///
/// The projection of an entity that rule conditions are evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectAttributes {
    pub kind: SubjectKind,
    /// Author, uploader, or for a user profile the user itself.
    pub owner_id: Option<Uuid>,
    pub locked: bool,
    /// Lock flag of the enclosing container (the post a comment hangs off).
    pub parent_locked: bool,
    pub visible: bool,
}

impl SubjectAttributes {
    /// A kind-level subject with no owner, used for checks that happen before
    /// an instance exists (creating a thread, listing tags).
    pub fn of_kind(kind: SubjectKind) -> Self {
        Self {
            kind,
            owner_id: None,
            locked: false,
            parent_locked: false,
            visible: true,
        }
    }

    pub fn owned_by(mut self, owner_id: Uuid) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    pub fn parent_locked(mut self, parent_locked: bool) -> Self {
        self.parent_locked = parent_locked;
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

/// Subject
///
/// Implemented by every entity passed to a policy check.
pub trait Subject {
    fn attributes(&self) -> SubjectAttributes;
}

impl Subject for SubjectAttributes {
    fn attributes(&self) -> SubjectAttributes {
        self.clone()
    }
}
