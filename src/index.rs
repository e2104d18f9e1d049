//! The lookup structures built from parsed annotations
use std::collections::HashMap;

use tracing::debug;

use crate::{AnnotationRecord, ByteString, EntityAnnotations};

mod symbols;
pub use symbols::{EntityIndex, SymbolIndex};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// `AnnotationIndex` holds the annotations of every entity
///
/// The index groups [`AnnotationRecord`]s by entity into
/// [`EntityAnnotations`] and allows to look them up by symbol, by object id
/// or by synonym. It is built once and never modified afterwards, so it can
/// be shared between threads for reading.
///
/// # Examples
///
/// ```
/// use hpo_assoc::{AnnotationIndex, AnnotationRecord, ByteString, SymbolIndex, TermId};
///
/// let records = vec![
///     AnnotationRecord::new("100050", TermId::new("HP", 28)).with_evidence("IEA"),
///     AnnotationRecord::new("100050", TermId::new("HP", 175)).with_evidence("TAS"),
///     AnnotationRecord::new("999999", TermId::new("HP", 1)),
/// ];
/// let symbols = SymbolIndex::new(
///     vec![ByteString::from("100050")],
///     vec![(ByteString::from("AARSKOG SYNDROME"), ByteString::from("100050"))],
///     vec![(ByteString::from("OMIM:100050"), ByteString::from("100050"))],
/// ).unwrap();
///
/// let index = AnnotationIndex::new(records, symbols);
///
/// // records of unknown entities are not part of the index
/// assert_eq!(index.len(), 1);
///
/// let disease = index.lookup("AARSKOG SYNDROME").unwrap();
/// assert_eq!(disease.id(), "100050");
/// assert_eq!(disease.len(), 2);
/// assert!(index.is_synonym("AARSKOG SYNDROME"));
/// assert!(!index.is_symbol("AARSKOG SYNDROME"));
///
/// let evidence = index.evidence_histogram();
/// assert_eq!(evidence[&ByteString::from("IEA")], 1);
/// ```
///
/// # Lookup
///
/// Every key is resolved in three steps. The first step that knows the key
/// wins:
///
/// ```mermaid
/// flowchart LR
///     KEY[key] --> SYM{symbol?}
///     SYM -- yes --> E[EntityAnnotations]
///     SYM -- no --> OID{object id?}
///     OID -- yes --> E
///     OID -- no --> SYN{synonym?}
///     SYN -- yes --> E
///     SYN -- no --> NONE[None]
/// ```
///
/// # Layout
///
/// ```mermaid
/// erDiagram
///     ANNOTATIONINDEX ||--|| SYMBOLINDEX : resolves_keys
///     ANNOTATIONINDEX ||--o{ ENTITYANNOTATIONS : contains
///     ENTITYANNOTATIONS ||--|{ ANNOTATIONRECORD : contains
///     SYMBOLINDEX {
///         ByteString symbols
///         ByteString object_ids
///         ByteString synonyms
///     }
///     ENTITYANNOTATIONS {
///         ByteString id
///         TermId terms
///     }
///     ANNOTATIONRECORD {
///         ByteString object_id
///         TermId term_id
///         ByteString evidence
///     }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    entities: Vec<Option<EntityAnnotations>>,
    symbols: SymbolIndex,
}

impl AnnotationIndex {
    /// Builds the index from `records`
    ///
    /// The object id of every record is resolved as a symbol of `symbols`.
    /// Records of entities that are not part of `symbols` are ignored.
    pub fn new<I>(records: I, symbols: SymbolIndex) -> Self
    where
        I: IntoIterator<Item = AnnotationRecord>,
    {
        let mut entities: Vec<Option<EntityAnnotations>> = vec![None; symbols.len()];
        let mut unknown = 0usize;

        for record in records {
            let Some(idx) = symbols.find_symbol(record.object_id()) else {
                unknown += 1;
                continue;
            };
            let entity = entities[idx.as_usize()]
                .get_or_insert_with(|| EntityAnnotations::new(record.object_id().clone()));
            entity.add(record);
        }

        if unknown > 0 {
            debug!("Ignored {} records of unknown entities", unknown);
        }

        Self { entities, symbols }
    }

    /// Resolves `key` as symbol, object id or synonym, in that order
    fn resolve(&self, key: &ByteString) -> Option<EntityIndex> {
        self.symbols
            .find_symbol(key)
            .or_else(|| self.symbols.find_object_id(key))
            .or_else(|| self.symbols.find_synonym(key))
    }

    /// Returns the annotations of the entity with the symbol, object id or
    /// synonym `key`
    ///
    /// Returns `None` if the key is unknown or the entity has no annotations.
    pub fn lookup<K: AsRef<[u8]>>(&self, key: K) -> Option<&EntityAnnotations> {
        let idx = self.resolve(&ByteString::new(key.as_ref()))?;
        self.get(idx)
    }

    /// Returns the annotations of the entity `idx`
    pub fn get(&self, idx: EntityIndex) -> Option<&EntityAnnotations> {
        self.entities.get(idx.as_usize())?.as_ref()
    }

    /// Returns `true` if `key` is the symbol of an entity
    pub fn is_symbol<K: AsRef<[u8]>>(&self, key: K) -> bool {
        self.symbols.map_symbol(key).is_some()
    }

    /// Returns `true` if `key` is the object id of an entity
    pub fn is_object_id<K: AsRef<[u8]>>(&self, key: K) -> bool {
        self.symbols.map_object_id(key).is_some()
    }

    /// Returns `true` if `key` is a synonym of an entity
    pub fn is_synonym<K: AsRef<[u8]>>(&self, key: K) -> bool {
        self.symbols.map_synonym(key).is_some()
    }

    /// Iterates the identifiers of all recognized entities
    ///
    /// This includes entities of the [`SymbolIndex`] without any
    /// annotation. See [`AnnotationIndex::annotated_entities`] for the
    /// entities with annotations only.
    pub fn all_entities(&self) -> std::slice::Iter<'_, ByteString> {
        self.symbols.symbols().iter()
    }

    /// Iterates the identifiers of all annotated entities
    pub fn annotated_entities(&self) -> impl Iterator<Item = &ByteString> {
        self.iter().map(EntityAnnotations::id)
    }

    /// Iterates the [`EntityAnnotations`] of all annotated entities
    pub fn iter(&self) -> impl Iterator<Item = &EntityAnnotations> {
        self.entities.iter().flatten()
    }

    /// Returns the number of annotated entities
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns `true` if no entity has annotations
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Returns the total number of distinct annotations of all entities
    pub fn annotation_count(&self) -> usize {
        self.iter().map(EntityAnnotations::len).sum()
    }

    /// Counts how often every evidence code is used
    ///
    /// Only the annotations kept in the index are counted.
    pub fn evidence_histogram(&self) -> HashMap<ByteString, usize> {
        let mut histogram = HashMap::new();
        for record in self.iter().flatten() {
            *histogram.entry(record.evidence().clone()).or_insert(0) += 1;
        }
        histogram
    }

    /// The [`SymbolIndex`] that resolves lookup keys
    pub fn symbols(&self) -> &SymbolIndex {
        &self.symbols
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::TermId;

    fn bs(s: &str) -> ByteString {
        ByteString::from(s)
    }

    fn index() -> AnnotationIndex {
        let records = vec![
            AnnotationRecord::new("100050", TermId::new("HP", 28)).with_evidence("IEA"),
            AnnotationRecord::new("100050", TermId::new("HP", 175)).with_evidence("IEA"),
            AnnotationRecord::new("100050", TermId::new("HP", 28)).with_evidence("TAS"),
            AnnotationRecord::new("100070", TermId::new("HP", 1)).with_evidence("TAS"),
            AnnotationRecord::new("unknown", TermId::new("HP", 1)).with_evidence("PCS"),
        ];
        let symbols = SymbolIndex::new(
            vec![bs("100050"), bs("100070"), bs("100100")],
            vec![
                (bs("AARSKOG SYNDROME"), bs("100050")),
                (bs("AAS"), bs("100050")),
                (bs("ABDOMINAL AORTIC ANEURYSM"), bs("100070")),
            ],
            vec![
                (bs("OMIM:100050"), bs("100050")),
                (bs("OMIM:100070"), bs("100070")),
            ],
        )
        .unwrap();
        AnnotationIndex::new(records, symbols)
    }

    #[test]
    fn entities() {
        let index = index();
        assert_eq!(index.len(), 2);
        assert!(!index.is_empty());
        assert_eq!(index.symbols().len(), 3);
        let ids: Vec<&ByteString> = index.annotated_entities().collect();
        assert_eq!(ids, vec![&bs("100050"), &bs("100070")]);
        let all: Vec<&ByteString> = index.all_entities().collect();
        assert_eq!(all, vec![&bs("100050"), &bs("100070"), &bs("100100")]);
        assert_eq!(index.annotation_count(), 3);
    }

    #[test]
    fn lookup_all_keys() {
        let index = index();
        let by_symbol = index.lookup("100050").unwrap();
        for key in ["OMIM:100050", "AARSKOG SYNDROME", "AAS"] {
            let entity = index.lookup(key).unwrap();
            assert!(std::ptr::eq(by_symbol, entity), "{key} resolves to 100050");
        }
        assert_eq!(by_symbol.len(), 2);
        assert!(by_symbol.has_term(&TermId::new("HP", 175)));
    }

    #[test]
    fn symbol_without_annotations() {
        let index = index();
        assert!(index.is_symbol("100100"));
        assert!(index.lookup("100100").is_none());
    }

    #[test]
    fn lookup_unknown() {
        let index = index();
        assert!(index.lookup("unknownEntity").is_none());
        assert!(!index.is_symbol("unknownEntity"));
        assert!(!index.is_object_id("unknownEntity"));
        assert!(!index.is_synonym("unknownEntity"));
    }

    #[test]
    fn key_kinds() {
        let index = index();
        assert!(index.is_symbol("100070"));
        assert!(!index.is_object_id("100070"));
        assert!(index.is_object_id("OMIM:100070"));
        assert!(!index.is_synonym("OMIM:100070"));
        assert!(index.is_synonym("ABDOMINAL AORTIC ANEURYSM"));
    }

    #[test]
    fn evidence_histogram() {
        let histogram = index().evidence_histogram();
        assert_eq!(histogram.len(), 2);
        assert_eq!(histogram[&bs("IEA")], 2);
        assert_eq!(histogram[&bs("TAS")], 1);
        assert!(!histogram.contains_key(&bs("PCS")));
    }

    #[test]
    fn all_entities_without_annotations() {
        let symbols = SymbolIndex::new(vec![bs("a"), bs("b")], Vec::new(), Vec::new()).unwrap();
        let index = AnnotationIndex::new(vec![AnnotationRecord::new("a", TermId::new("HP", 1))], symbols);

        let all: Vec<&ByteString> = index.all_entities().collect();
        assert_eq!(all, vec![&bs("a"), &bs("b")]);
        assert_eq!(index.annotated_entities().count(), 1);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn empty_index() {
        let index = AnnotationIndex::default();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert!(index.evidence_histogram().is_empty());
        assert!(index.lookup("100050").is_none());
        assert_eq!(index.all_entities().count(), 0);
    }
}
