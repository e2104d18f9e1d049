use core::fmt::Debug;
use std::collections::HashSet;
use std::fmt::Display;
use std::sync::Arc;

use crate::bytestring::{find, ByteString};
use crate::{AssocError, AssocResult};

/// Interns the prefixes of [`TermId`]s
///
/// Annotation files contain the same handful of prefixes (`HP`, `GO`, ...)
/// millions of times. All [`TermId`]s created through the same pool share
/// one allocation per prefix.
#[derive(Debug, Default, Clone)]
pub struct PrefixPool {
    prefixes: HashSet<Arc<str>>,
}

impl PrefixPool {
    /// Constructs a new, empty [`PrefixPool`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared instance of `prefix`, adding it if not yet present
    pub fn intern(&mut self, prefix: &str) -> Arc<str> {
        if let Some(shared) = self.prefixes.get(prefix) {
            return Arc::clone(shared);
        }
        let shared: Arc<str> = Arc::from(prefix);
        self.prefixes.insert(Arc::clone(&shared));
        shared
    }

    /// Returns the number of distinct prefixes
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    /// Returns `true` if no prefix was interned yet
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

/// Identifier of an ontology term, e.g. `HP:0002487`
///
/// A [`TermId`] consists of a prefix and a numerical id. Two ids are equal
/// if both parts are equal.
///
/// # Examples
///
/// ```
/// use hpo_assoc::TermId;
///
/// let id = TermId::try_from("HP:0000028").unwrap();
/// assert_eq!(id.prefix(), "HP");
/// assert_eq!(id.as_u32(), 28);
/// assert_eq!(id.to_string(), "HP:0000028");
/// ```
#[derive(Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TermId {
    prefix: Arc<str>,
    inner: u32,
}

impl TermId {
    /// Constructs a new [`TermId`] from a prefix and the numerical id
    pub fn new(prefix: &str, id: u32) -> Self {
        Self {
            prefix: Arc::from(prefix),
            inner: id,
        }
    }

    /// Constructs a new [`TermId`], taking the prefix from `pool`
    pub fn with_pool(prefix: &str, id: u32, pool: &mut PrefixPool) -> Self {
        Self {
            prefix: pool.intern(prefix),
            inner: id,
        }
    }

    /// Parses a [`TermId`] like `HP:0000028` from raw bytes
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// [`AssocError::InvalidInput`] if there is no `:`, the prefix is empty
    /// or not alphanumeric, or the part after `:` is not a number
    pub fn parse(bytes: &[u8], pool: &mut PrefixPool) -> AssocResult<Self> {
        let bytes = crate::bytestring::trim(bytes);
        let invalid =
            || AssocError::InvalidInput(format!("invalid term id {}", String::from_utf8_lossy(bytes)));

        let colon = find(bytes, b":").ok_or_else(invalid)?;
        let (prefix, number) = (&bytes[..colon], &bytes[colon + 1..]);

        if prefix.is_empty() || !prefix.iter().all(u8::is_ascii_alphanumeric) {
            return Err(invalid());
        }
        if number.is_empty() || !number.iter().all(u8::is_ascii_digit) {
            return Err(invalid());
        }

        let prefix = std::str::from_utf8(prefix).map_err(|_| invalid())?;
        let id = ByteString::parse_first_int(number)?;
        Ok(Self::with_pool(prefix, id, pool))
    }

    /// Returns the prefix, e.g. `HP`
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the numerical part of the id
    pub fn as_u32(&self) -> u32 {
        self.inner
    }
}

impl TryFrom<&str> for TermId {
    type Error = AssocError;
    fn try_from(s: &str) -> AssocResult<Self> {
        TermId::parse(s.as_bytes(), &mut PrefixPool::default())
    }
}

impl Debug for TermId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TermId({self})")
    }
}

impl Display for TermId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{:07}", self.prefix, self.inner)
    }
}

impl PartialEq<str> for TermId {
    fn eq(&self, other: &str) -> bool {
        TermId::try_from(other).map_or(false, |other| self == &other)
    }
}

impl PartialEq<&str> for TermId {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}
