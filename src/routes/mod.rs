/// Router Module Index
///
/// Routes are split by how the caller is identified. Authentication is a
/// router layer; what an identified caller may do is decided per handler by
/// the ability engine.

/// Routes open to anonymous callers. An identity is optional and only widens
/// what is visible (hidden content for moderators).
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
pub mod authenticated;

/// Lock and visibility switches. Authenticated like the routes above; only
/// moderators and administrators pass the field checks.
pub mod moderation;
