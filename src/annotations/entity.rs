use std::collections::HashSet;

use crate::{AnnotationRecord, ByteString, TermId};

/// All annotations of a single entity (e.g. a disease)
///
/// Every term occurs only once. When a record for an already present term
/// is added, the first record is kept.
///
/// # Examples
///
/// ```
/// use hpo_assoc::{AnnotationRecord, EntityAnnotations, TermId};
///
/// let mut disease = EntityAnnotations::new("100050".into());
/// assert!(disease.add(AnnotationRecord::new("100050", TermId::new("HP", 28))));
/// assert!(!disease.add(AnnotationRecord::new("100050", TermId::new("HP", 28))));
///
/// // records of other entities are rejected
/// assert!(!disease.add(AnnotationRecord::new("100070", TermId::new("HP", 1))));
///
/// assert_eq!(disease.len(), 1);
/// assert!(disease.has_term(&TermId::new("HP", 28)));
/// ```
#[derive(Debug, Clone)]
pub struct EntityAnnotations {
    id: ByteString,
    records: Vec<AnnotationRecord>,
    terms: HashSet<TermId>,
}

impl EntityAnnotations {
    /// Constructs a new, empty set for the entity `id`
    pub fn new(id: ByteString) -> Self {
        Self {
            id,
            records: Vec::new(),
            terms: HashSet::new(),
        }
    }

    /// The identifier (object accession) of the entity
    pub fn id(&self) -> &ByteString {
        &self.id
    }

    /// Adds `record` to the set
    ///
    /// Returns whether the record was added. That is:
    ///
    /// - If the record belongs to this entity and its term is new, true is returned.
    /// - If the record belongs to another entity, false is returned.
    /// - If the set already contains a record of the same term, false is returned.
    pub fn add(&mut self, record: AnnotationRecord) -> bool {
        if record.object_id() != &self.id {
            return false;
        }
        if !self.terms.insert(record.term_id().clone()) {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Returns the number of distinct annotated terms
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the entity has no annotations
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns `true` if the entity is annotated to `term_id`
    pub fn has_term(&self, term_id: &TermId) -> bool {
        self.terms.contains(term_id)
    }

    /// Returns the distinct annotated terms in insertion order
    pub fn associations(&self) -> Vec<TermId> {
        self.term_ids().cloned().collect()
    }

    /// Iterates the distinct annotated terms in insertion order
    pub fn term_ids(&self) -> impl Iterator<Item = &TermId> {
        self.records.iter().map(AnnotationRecord::term_id)
    }

    /// Iterates the [`AnnotationRecord`]s in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, AnnotationRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a EntityAnnotations {
    type Item = &'a AnnotationRecord;
    type IntoIter = std::slice::Iter<'a, AnnotationRecord>;
    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn record(id: &str, term: u32, evidence: &str) -> AnnotationRecord {
        AnnotationRecord::new(id, TermId::new("HP", term)).with_evidence(evidence)
    }

    #[test]
    fn first_record_wins() {
        let mut disease = EntityAnnotations::new("100050".into());
        assert!(disease.add(record("100050", 28, "IEA")));
        assert!(!disease.add(record("100050", 28, "TAS")));
        assert_eq!(disease.len(), 1);
        assert_eq!(disease.iter().next().unwrap().evidence(), "IEA");
    }

    #[test]
    fn add_is_idempotent() {
        let mut once = EntityAnnotations::new("100050".into());
        let mut twice = EntityAnnotations::new("100050".into());
        for term in [28, 175, 28, 1] {
            once.add(record("100050", term, "IEA"));
            twice.add(record("100050", term, "IEA"));
            twice.add(record("100050", term, "IEA"));
        }
        assert_eq!(once.len(), 3);
        assert_eq!(once.len(), twice.len());
        assert_eq!(once.associations(), twice.associations());
    }

    #[test]
    fn rejects_foreign_records() {
        let mut disease = EntityAnnotations::new("100050".into());
        assert!(!disease.add(record("100051", 28, "IEA")));
        assert!(disease.is_empty());
        assert!(!disease.has_term(&TermId::new("HP", 28)));
    }

    #[test]
    fn insertion_order() {
        let mut disease = EntityAnnotations::new("100050".into());
        for term in [175, 28, 1, 28] {
            disease.add(record("100050", term, "IEA"));
        }
        assert_eq!(
            disease.associations(),
            vec![
                TermId::new("HP", 175),
                TermId::new("HP", 28),
                TermId::new("HP", 1)
            ]
        );
        let terms: Vec<u32> = (&disease)
            .into_iter()
            .map(|r| r.term_id().as_u32())
            .collect();
        assert_eq!(terms, vec![175, 28, 1]);
    }
}
