//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Oid`] - Git object identifier (SHA) with a zero sentinel
//! - [`RefName`] - Validated Git reference name
//! - [`RefUpdate`] - One `(old, new, ref)` triple as delivered by a push
//! - [`ChangeKind`] - Create / update / delete, derived from the sentinels
//! - [`RefKind`] - What sort of reference was touched
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use refnotify::core::types::{ChangeKind, Oid, RefName, RefUpdate};
//!
//! let update = RefUpdate::parse_line(
//!     "0000000000000000000000000000000000000000 \
//!      abc123def4567890abc123def4567890abc12345 refs/heads/main",
//! )
//! .unwrap();
//! assert_eq!(update.change_kind(), ChangeKind::Create);
//!
//! assert!(RefName::new("refs/heads/bad..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),

    #[error("invalid ref update: {0}")]
    InvalidUpdate(String),
}

/// A Git object identifier (SHA-1 or SHA-256).
///
/// OIDs are normalized to lowercase for consistency. The all-zero id is
/// the sentinel a push uses for "no value" on either side of an update.
///
/// # Example
///
/// ```
/// use refnotify::core::types::Oid;
///
/// // Create from hex string (normalized to lowercase)
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
///
/// // Get abbreviated form
/// assert_eq!(oid.short(7), "abc123d");
///
/// // Zero OID for null references
/// let zero = Oid::zero();
/// assert!(zero.is_zero());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// The zero OID (40 zeros for SHA-1).
    const ZERO_SHA1: &'static str = "0000000000000000000000000000000000000000";

    /// Abbreviation length used in subjects and one-line summaries.
    pub const SHORT_LEN: usize = 7;

    /// Create a new validated object id.
    ///
    /// The OID is normalized to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a valid hex OID.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        Self::validate(&oid)?;
        Ok(Self(oid))
    }

    /// Create the zero/null OID (40 zeros).
    pub fn zero() -> Self {
        Self(Self::ZERO_SHA1.to_string())
    }

    /// Check if this is the zero/null OID.
    ///
    /// Works for both SHA-1 and SHA-256 widths.
    pub fn is_zero(&self) -> bool {
        self.0.chars().all(|c| c == '0')
    }

    /// Get an abbreviated form of the OID.
    ///
    /// Returns the first `len` characters. If `len` exceeds the OID length,
    /// returns the full OID.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    /// Validate an object id.
    fn validate(oid: &str) -> Result<(), TypeError> {
        // SHA-1 is 40 hex chars, SHA-256 is 64
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated Git reference name.
///
/// Reference names must conform to Git's refname rules (see `git check-ref-format`).
///
/// # Example
///
/// ```
/// use refnotify::core::types::RefName;
///
/// let refname = RefName::new("refs/heads/feature/foo").unwrap();
/// assert_eq!(refname.short_name(), "feature/foo");
/// assert!(refname.is_branch_ref());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    pub const HEADS: &'static str = "refs/heads/";
    pub const TAGS: &'static str = "refs/tags/";
    pub const REMOTES: &'static str = "refs/remotes/";

    /// Create a new validated ref name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Create a ref name for a branch (`refs/heads/<branch>`).
    pub fn for_branch(branch: &str) -> Result<Self, TypeError> {
        Self::new(format!("{}{}", Self::HEADS, branch))
    }

    /// Strip a prefix from the ref name and return the remainder.
    ///
    /// Returns `None` if the ref doesn't start with the given prefix.
    pub fn strip_prefix(&self, prefix: &str) -> Option<&str> {
        self.0.strip_prefix(prefix)
    }

    /// Check if this ref is a branch ref.
    pub fn is_branch_ref(&self) -> bool {
        self.0.starts_with(Self::HEADS)
    }

    /// Check if this ref is a tag ref.
    pub fn is_tag_ref(&self) -> bool {
        self.0.starts_with(Self::TAGS)
    }

    /// Check if this ref is a remote-tracking ref.
    pub fn is_remote_ref(&self) -> bool {
        self.0.starts_with(Self::REMOTES)
    }

    /// The name with its well-known namespace prefix removed.
    ///
    /// `refs/heads/main` → `main`, `refs/tags/v1.0` → `v1.0`,
    /// `refs/remotes/origin/main` → `origin/main`. Refs outside those
    /// namespaces are returned unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// use refnotify::core::types::RefName;
    ///
    /// assert_eq!(RefName::new("refs/tags/v1.0").unwrap().short_name(), "v1.0");
    /// assert_eq!(RefName::new("refs/notes/commits").unwrap().short_name(), "refs/notes/commits");
    /// ```
    pub fn short_name(&self) -> &str {
        [Self::HEADS, Self::TAGS, Self::REMOTES]
            .iter()
            .find_map(|prefix| self.strip_prefix(prefix))
            .unwrap_or(&self.0)
    }

    /// Validate a ref name against Git's refname rules.
    fn validate(name: &str) -> Result<(), TypeError> {
        // Cannot be empty
        if name.is_empty() {
            return Err(TypeError::InvalidRefName("ref name cannot be empty".into()));
        }

        // Cannot start with "/"
        if name.starts_with('/') {
            return Err(TypeError::InvalidRefName(
                "ref name cannot start with '/'".into(),
            ));
        }

        // Cannot end with "/" or ".lock"
        if name.ends_with('/') {
            return Err(TypeError::InvalidRefName(
                "ref name cannot end with '/'".into(),
            ));
        }
        if name.ends_with(".lock") {
            return Err(TypeError::InvalidRefName(
                "ref name cannot end with '.lock'".into(),
            ));
        }

        // Cannot contain "..", "@{", or "//"
        for bad in ["..", "@{", "//"] {
            if name.contains(bad) {
                return Err(TypeError::InvalidRefName(format!(
                    "ref name cannot contain '{bad}'"
                )));
            }
        }

        // Cannot contain certain special characters
        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        for c in INVALID_CHARS {
            if name.contains(c) {
                return Err(TypeError::InvalidRefName(format!(
                    "ref name cannot contain '{c}'"
                )));
            }
        }

        if name.chars().any(|c| c.is_ascii_control()) {
            return Err(TypeError::InvalidRefName(
                "ref name cannot contain control characters".into(),
            ));
        }

        for component in name.split('/') {
            if component.starts_with('.') {
                return Err(TypeError::InvalidRefName(
                    "path component cannot start with '.'".into(),
                ));
            }
            if component.ends_with(".lock") {
                return Err(TypeError::InvalidRefName(
                    "path component cannot end with '.lock'".into(),
                ));
            }
        }

        Ok(())
    }

    /// Get the ref name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What happened to a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl ChangeKind {
    /// Past-tense verb used in subjects and preambles.
    pub fn past_tense(&self) -> &'static str {
        match self {
            ChangeKind::Create => "created",
            ChangeKind::Update => "updated",
            ChangeKind::Delete => "deleted",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChangeKind::Create => "create",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// The sort of reference an update touched.
///
/// Derived from the ref name prefix and the type of the object the
/// ref points at (a tag object makes a tag ref annotated).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefKind {
    Branch,
    TrackingBranch,
    Tag,
    AnnotatedTag,
    Other,
}

impl RefKind {
    /// Human-readable label, also used for the `X-Git-Reftype` header.
    pub fn label(&self) -> &'static str {
        match self {
            RefKind::Branch => "branch",
            RefKind::TrackingBranch => "tracking branch",
            RefKind::Tag => "tag",
            RefKind::AnnotatedTag => "annotated tag",
            RefKind::Other => "reference",
        }
    }
}

impl std::fmt::Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single reference update: the ref moved from `old` to `new`.
///
/// Either side may be the zero sentinel, but not both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefUpdate {
    pub old: Oid,
    pub new: Oid,
    pub refname: RefName,
}

impl RefUpdate {
    /// Create a validated update.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidUpdate` if both ids are zero.
    pub fn new(refname: RefName, old: Oid, new: Oid) -> Result<Self, TypeError> {
        if old.is_zero() && new.is_zero() {
            return Err(TypeError::InvalidUpdate(format!(
                "{refname}: old and new are both the zero id"
            )));
        }
        Ok(Self { old, new, refname })
    }

    /// Build an update from the three raw strings, in hook argument order.
    pub fn from_parts(refname: &str, old: &str, new: &str) -> Result<Self, TypeError> {
        Self::new(RefName::new(refname)?, Oid::new(old)?, Oid::new(new)?)
    }

    /// Parse one `post-receive` style line: `<old> <new> <refname>`.
    ///
    /// Fields are separated by any run of whitespace.
    pub fn parse_line(line: &str) -> Result<Self, TypeError> {
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(old), Some(new), Some(refname), None) => Self::from_parts(refname, old, new),
            _ => Err(TypeError::InvalidUpdate(format!(
                "expected '<old> <new> <ref>', got '{}'",
                line.trim()
            ))),
        }
    }

    /// Derive the change kind from the zero sentinels.
    pub fn change_kind(&self) -> ChangeKind {
        if self.old.is_zero() {
            ChangeKind::Create
        } else if self.new.is_zero() {
            ChangeKind::Delete
        } else {
            ChangeKind::Update
        }
    }

    /// The object that stands for this update: `new`, or `old` for deletes.
    pub fn representative(&self) -> &Oid {
        match self.change_kind() {
            ChangeKind::Delete => &self.old,
            ChangeKind::Create | ChangeKind::Update => &self.new,
        }
    }
}

impl std::fmt::Display for RefUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} -> {}", self.refname, self.old, self.new)
    }
}
