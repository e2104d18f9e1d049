use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::TermId;

/// Answers whether a [`TermId`] is part of the loaded ontology
///
/// The parser uses this to skip annotations to unknown terms and to replace
/// alternative (outdated) ids with their current primary id.
pub trait TermLookup {
    /// Returns `true` if `id` is a current, primary term of the ontology
    fn contains(&self, id: &TermId) -> bool;

    /// Returns the current primary id for `id`
    ///
    /// - `Some(id)` if `id` is itself a primary term
    /// - `Some(other)` if `id` is an alternative id of `other`
    /// - `None` if `id` is unknown or obsolete
    fn primary_id(&self, id: &TermId) -> Option<TermId> {
        self.contains(id).then(|| id.clone())
    }
}

impl TermLookup for HashSet<TermId> {
    fn contains(&self, id: &TermId) -> bool {
        HashSet::contains(self, id)
    }
}

/// A minimal catalog of the terms of an ontology
///
/// It holds the primary ids of all current terms and the mapping of
/// alternative ids to their primary id.
///
/// # Examples
///
/// ```
/// use hpo_assoc::{TermCatalog, TermId, TermLookup};
///
/// let mut catalog = TermCatalog::default();
/// catalog.insert(TermId::new("HP", 28));
/// catalog.insert_alternative(TermId::new("HP", 5), TermId::new("HP", 28));
///
/// assert!(catalog.contains(&TermId::new("HP", 28)));
/// assert!(!catalog.contains(&TermId::new("HP", 5)));
/// assert_eq!(
///     catalog.primary_id(&TermId::new("HP", 5)),
///     Some(TermId::new("HP", 28))
/// );
/// assert!(catalog.primary_id(&TermId::new("HP", 1)).is_none());
/// ```
#[derive(Debug, Default, Clone)]
pub struct TermCatalog {
    terms: HashSet<TermId>,
    alternatives: HashMap<TermId, TermId>,
}

impl TermCatalog {
    /// Constructs a new, empty [`TermCatalog`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of primary terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns `true` if the catalog contains no terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Adds a primary term
    ///
    /// Returns `false` if the term was already present
    pub fn insert(&mut self, id: TermId) -> bool {
        self.alternatives.remove(&id);
        self.terms.insert(id)
    }

    /// Registers `alternative` as an outdated id of `primary`
    ///
    /// The first registration of an alternative id wins. Ids that are
    /// primary terms themselves are never used as alternatives.
    pub fn insert_alternative(&mut self, alternative: TermId, primary: TermId) {
        if self.terms.contains(&alternative) {
            return;
        }
        if let Entry::Vacant(entry) = self.alternatives.entry(alternative) {
            entry.insert(primary);
        }
    }

    /// Returns an iterator of all primary ids
    pub fn iter(&self) -> std::collections::hash_set::Iter<'_, TermId> {
        self.terms.iter()
    }
}

impl TermLookup for TermCatalog {
    fn contains(&self, id: &TermId) -> bool {
        self.terms.contains(id)
    }

    fn primary_id(&self, id: &TermId) -> Option<TermId> {
        if self.terms.contains(id) {
            return Some(id.clone());
        }
        self.alternatives
            .get(id)
            .filter(|primary| self.terms.contains(*primary))
            .cloned()
    }
}

impl FromIterator<TermId> for TermCatalog {
    fn from_iter<T: IntoIterator<Item = TermId>>(iter: T) -> Self {
        Self {
            terms: iter.into_iter().collect(),
            alternatives: HashMap::new(),
        }
    }
}
