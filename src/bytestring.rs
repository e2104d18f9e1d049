//! Compact, immutable byte strings used for every parsed field
//!
//! Annotation files contain millions of short, highly repetitive values
//! (database names, evidence codes, accessions). [`ByteString`] stores them
//! inline without a heap allocation when they are short and caches its hash,
//! so that repeated map lookups don't rehash the content. Longer values,
//! like disease names, are deduplicated through a [`ByteStringPool`].
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use smallvec::SmallVec;

use crate::{AssocError, AssocResult};

/// Number of bytes stored inline before spilling to the heap
///
/// Most fields of an annotation line (database, accession, term id,
/// evidence code, dates) fit into this.
const INLINE_CAPACITY: usize = 24;

/// An immutable sequence of bytes with value semantics
///
/// Equality, ordering and hashing are defined by the content. The hash is
/// computed on first use and cached for the lifetime of the value.
///
/// All input is assumed to be ASCII-7, so a [`ByteString`] can be compared
/// directly with `str`.
///
/// # Examples
///
/// ```
/// use hpo_assoc::ByteString;
///
/// let line = b"OMIM\t100050\tAARSKOG SYNDROME";
/// let accession = ByteString::from_range(line, 5, 11);
///
/// assert_eq!(accession, "100050");
/// assert!(accession.starts_with("100"));
/// assert_eq!(accession.len(), 6);
/// ```
#[derive(Clone, Default)]
pub struct ByteString {
    storage: Storage,
    hash: OnceLock<u32>,
}

/// Short values live inline, longer ones are shared between all clones
#[derive(Clone)]
enum Storage {
    Inline(SmallVec<[u8; INLINE_CAPACITY]>),
    Shared(Arc<[u8]>),
}

impl Default for Storage {
    fn default() -> Self {
        Storage::Inline(SmallVec::new())
    }
}

impl ByteString {
    /// Constructs a new [`ByteString`] by copying the given bytes
    pub fn new(bytes: &[u8]) -> Self {
        let storage = if bytes.len() <= INLINE_CAPACITY {
            Storage::Inline(SmallVec::from_slice(bytes))
        } else {
            Storage::Shared(Arc::from(bytes))
        };
        Self {
            storage,
            hash: OnceLock::new(),
        }
    }

    /// Constructs a [`ByteString`] from `buf[start..end]`
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds of `buf`
    pub fn from_range(buf: &[u8], start: usize, end: usize) -> Self {
        Self::new(&buf[start..end])
    }

    /// Constructs a [`ByteString`] from `buf[start..end]`, leaving out
    /// leading and trailing spaces, tabs, carriage returns and line feeds
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds of `buf`
    pub fn trimmed_from_range(buf: &[u8], start: usize, end: usize) -> Self {
        Self::new(trim(&buf[start..end]))
    }

    /// Returns the number of bytes
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns `true` if the [`ByteString`] contains no bytes
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Returns the underlying bytes
    pub fn as_bytes(&self) -> &[u8] {
        match &self.storage {
            Storage::Inline(bytes) => bytes,
            Storage::Shared(bytes) => bytes,
        }
    }

    /// Returns `true` if both values point to the same heap allocation
    ///
    /// Only values longer than the inline capacity are ever shared. Clones
    /// of such a value, e.g. handed out by a [`ByteStringPool`], share
    /// their storage.
    pub fn shares_storage(&self, other: &ByteString) -> bool {
        match (&self.storage, &other.storage) {
            (Storage::Shared(a), Storage::Shared(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Returns the content as text
    ///
    /// Invalid UTF-8 sequences are replaced with `U+FFFD`.
    pub fn to_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    /// Returns `true` if the [`ByteString`] starts with `prefix`
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.as_bytes().starts_with(prefix.as_bytes())
    }

    /// Returns `true` if the [`ByteString`] starts with `prefix`,
    /// ignoring ASCII case
    pub fn starts_with_ignore_case(&self, prefix: &str) -> bool {
        let prefix = prefix.as_bytes();
        self.as_bytes().len() >= prefix.len()
            && self.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix)
    }

    /// Returns `true` if both contain the same bytes, ignoring ASCII case
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.as_bytes().eq_ignore_ascii_case(other.as_bytes())
    }

    /// Returns a new [`ByteString`] with the bytes of `begin..end`
    ///
    /// # Panics
    ///
    /// Panics if `begin > end` or `end > self.len()`
    pub fn substring(&self, begin: usize, end: usize) -> ByteString {
        ByteString::from_range(self.as_bytes(), begin, end)
    }

    /// Same as [`ByteString::substring`] but without leading and trailing
    /// whitespace
    ///
    /// # Panics
    ///
    /// Panics if `begin > end` or `end > self.len()`
    pub fn trimmed_substring(&self, begin: usize, end: usize) -> ByteString {
        ByteString::trimmed_from_range(self.as_bytes(), begin, end)
    }

    /// Returns the position of the first occurrence of `needle`
    ///
    /// An empty `needle` is found at position `0`.
    pub fn index_of<N: AsRef<[u8]>>(&self, needle: N) -> Option<usize> {
        find(self.as_bytes(), needle.as_ref())
    }

    /// Returns `true` if `needle` occurs somewhere in the [`ByteString`]
    pub fn contains<N: AsRef<[u8]>>(&self, needle: N) -> bool {
        self.index_of(needle).is_some()
    }

    /// Splits at every occurrence of `delimiter`
    ///
    /// Leading, trailing and consecutive delimiters produce empty entries,
    /// so the result always contains one more entry than there are
    /// delimiters.
    ///
    /// # Examples
    ///
    /// ```
    /// use hpo_assoc::ByteString;
    ///
    /// let parts = ByteString::from("|NOT|").split_by_single_char(b'|');
    /// assert_eq!(parts.len(), 3);
    /// assert!(parts[0].is_empty());
    /// assert_eq!(parts[1], "NOT");
    /// assert!(parts[2].is_empty());
    /// ```
    pub fn split_by_single_char(&self, delimiter: u8) -> Vec<ByteString> {
        self.as_bytes()
            .split(|b| *b == delimiter)
            .map(ByteString::new)
            .collect()
    }

    /// Parses the first run of decimal digits into an integer
    ///
    /// See [`ByteString::parse_first_int`]
    ///
    /// # Errors
    ///
    /// Same as [`ByteString::parse_first_int`]
    pub fn first_int(&self) -> AssocResult<u32> {
        Self::parse_first_int(self.as_bytes())
    }

    /// Parses the first run of decimal digits anywhere in `bytes`
    ///
    /// Everything before the first digit is ignored, and the number ends
    /// at the first non-digit.
    ///
    /// # Errors
    ///
    /// - [`AssocError::InvalidInput`]: `bytes` does not contain a digit
    /// - [`AssocError::ParseIntError`]: the number does not fit into `u32`
    ///
    /// # Examples
    ///
    /// ```
    /// use hpo_assoc::ByteString;
    ///
    /// assert_eq!(ByteString::parse_first_int(b"HP:0000028").unwrap(), 28);
    /// assert!(ByteString::parse_first_int(b"HP:").is_err());
    /// ```
    pub fn parse_first_int(bytes: &[u8]) -> AssocResult<u32> {
        let Some(start) = bytes.iter().position(u8::is_ascii_digit) else {
            return Err(AssocError::InvalidInput(format!(
                "no number in {}",
                String::from_utf8_lossy(bytes)
            )));
        };

        let mut value = 0u32;
        for digit in bytes[start..].iter().take_while(|b| b.is_ascii_digit()) {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(u32::from(digit - b'0')))
                .ok_or(AssocError::ParseIntError)?;
        }
        Ok(value)
    }

    /// Returns the cached hash of the content
    ///
    /// The hash is calculated on the first call. Content consisting only
    /// of zero bytes (or no bytes at all) is handled like any other content.
    pub fn hash_code(&self) -> u32 {
        *self.hash.get_or_init(|| {
            self.as_bytes()
                .iter()
                .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(u32::from(*b)))
        })
    }
}

/// Removes leading and trailing spaces, tabs, CR and LF
pub(crate) fn trim(bytes: &[u8]) -> &[u8] {
    let is_ws = |b: &u8| matches!(b, b' ' | b'\t' | b'\r' | b'\n');
    let Some(start) = bytes.iter().position(|b| !is_ws(b)) else {
        return &[];
    };
    let end = bytes
        .iter()
        .rposition(|b| !is_ws(b))
        .expect("a non-whitespace byte exists");
    &bytes[start..=end]
}

/// Returns the position of the first occurrence of `needle` in `haystack`
pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Hands out one canonical [`ByteString`] per distinct value
///
/// Every clone of the canonical value shares its storage, so a disease
/// name that occurs on hundreds of annotation lines is stored only once.
///
/// # Examples
///
/// ```
/// use hpo_assoc::bytestring::ByteStringPool;
///
/// let mut pool = ByteStringPool::new();
/// let a = pool.intern(b"AARSKOG-SCOTT SYNDROME, X-LINKED");
/// let b = pool.intern(b"AARSKOG-SCOTT SYNDROME, X-LINKED");
///
/// assert_eq!(a, b);
/// assert!(a.shares_storage(&b));
/// assert_eq!(pool.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ByteStringPool {
    values: HashSet<ByteString>,
}

impl ByteStringPool {
    /// Constructs a new, empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical [`ByteString`] for `bytes`
    ///
    /// The value is added to the pool when it is seen for the first time.
    pub fn intern(&mut self, bytes: &[u8]) -> ByteString {
        let candidate = ByteString::new(bytes);
        if let Some(canonical) = self.values.get(&candidate) {
            return canonical.clone();
        }
        self.values.insert(candidate.clone());
        candidate
    }

    /// Returns the number of distinct values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing was interned yet
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PartialEq for ByteString {
    fn eq(&self, other: &ByteString) -> bool {
        if self.as_bytes().len() != other.as_bytes().len() {
            return false;
        }
        if let (Some(a), Some(b)) = (self.hash.get(), other.hash.get()) {
            if a != b {
                return false;
            }
        }
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for ByteString {}

impl PartialEq<str> for ByteString {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for ByteString {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl PartialEq<ByteString> for str {
    fn eq(&self, other: &ByteString) -> bool {
        other == self
    }
}

impl PartialEq<ByteString> for &str {
    fn eq(&self, other: &ByteString) -> bool {
        other == *self
    }
}

impl PartialOrd for ByteString {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByteString {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl Hash for ByteString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash_code());
    }
}

impl AsRef<[u8]> for ByteString {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<&str> for ByteString {
    fn from(s: &str) -> Self {
        ByteString::new(s.as_bytes())
    }
}

impl From<String> for ByteString {
    fn from(s: String) -> Self {
        ByteString::new(s.as_bytes())
    }
}

impl From<&[u8]> for ByteString {
    fn from(bytes: &[u8]) -> Self {
        ByteString::new(bytes)
    }
}

impl From<&ByteString> for ByteString {
    fn from(other: &ByteString) -> Self {
        other.clone()
    }
}

impl Debug for ByteString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ByteString({:?})", self.to_text())
    }
}

impl Display for ByteString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}
