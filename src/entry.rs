//! Entry references used inside definition parameters.

use std::fmt;

/// Reference to another container entry.
///
/// An `Entry` placed in a definition's parameters, factory callable or
/// instance action means "substitute the resolved container entry with this
/// identifier here" rather than a literal value. Entries are plain data: they
/// own nothing and compare by identifier.
///
/// # Examples
///
/// ```rust
/// use keyed_di::{entry, Entry};
///
/// let reference = entry("database");
/// assert_eq!(reference.to_string(), "database");
/// assert_eq!(reference, Entry::new("database"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entry {
    id: String,
}

impl Entry {
    /// Creates a reference to the entry registered under `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// The referenced identifier.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl AsRef<str> for Entry {
    fn as_ref(&self) -> &str {
        &self.id
    }
}

impl From<Entry> for String {
    fn from(entry: Entry) -> Self {
        entry.id
    }
}

impl From<&str> for Entry {
    fn from(id: &str) -> Self {
        Entry::new(id)
    }
}

impl From<String> for Entry {
    fn from(id: String) -> Self {
        Entry::new(id)
    }
}

/// Shorthand for [`Entry::new`].
pub fn entry(id: impl Into<String>) -> Entry {
    Entry::new(id)
}

/// Validates a caller-supplied identifier.
pub(crate) fn check_id(id: &str) -> crate::DiResult<()> {
    if id.is_empty() {
        return Err(crate::DiError::invalid_argument("identifier must be a non-empty string"));
    }
    Ok(())
}
