use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::Display;

use crate::{AssocError, AssocResult, ByteString};

/// Reserved value, never assigned to an entity
const NOT_FOUND: u32 = u32::MAX;

/// Dense, zero-based index of an entity inside a [`SymbolIndex`]
///
/// The value is only meaningful for the [`SymbolIndex`] (and the
/// [`crate::AnnotationIndex`] built from it) that returned it.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub struct EntityIndex {
    inner: u32,
}

impl EntityIndex {
    /// Returns the index as `usize`, to be used as array offset
    pub fn as_usize(self) -> usize {
        self.inner as usize
    }
}

impl Display for EntityIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.inner)
    }
}

/// Maps the symbols, object ids and synonyms of all entities to a dense index
///
/// Every distinct symbol gets exactly one [`EntityIndex`]. Object ids and
/// synonyms are alternative keys that resolve to the index of their
/// symbol.
///
/// The index is built once and is immutable afterwards.
///
/// # Examples
///
/// ```
/// use hpo_assoc::{ByteString, SymbolIndex};
///
/// let symbols = SymbolIndex::new(
///     vec![ByteString::from("100050")],
///     vec![(ByteString::from("AARSKOG SYNDROME"), ByteString::from("100050"))],
///     vec![(ByteString::from("OMIM:100050"), ByteString::from("100050"))],
/// )
/// .unwrap();
///
/// let idx = symbols.map_symbol("100050").unwrap();
/// assert_eq!(symbols.map_object_id("OMIM:100050"), Some(idx));
/// assert_eq!(symbols.map_synonym("AARSKOG SYNDROME"), Some(idx));
/// assert!(symbols.map_symbol("OMIM:100050").is_none());
/// assert_eq!(symbols.symbols()[idx.as_usize()], "100050");
/// ```
#[derive(Debug, Default, Clone)]
pub struct SymbolIndex {
    symbols: Vec<ByteString>,
    object_ids: Vec<ByteString>,
    symbol_to_index: HashMap<ByteString, u32>,
    object_id_to_index: HashMap<ByteString, u32>,
    synonym_to_index: HashMap<ByteString, u32>,
}

impl SymbolIndex {
    /// Builds the index from symbols and loose synonym and object-id mappings
    ///
    /// `synonyms` and `object_ids` map a key to the symbol it refers to.
    /// Symbols that only appear as a mapping target are added to the index
    /// as well. Indices are assigned in the order symbols are first seen:
    /// first `symbols`, then the targets of `synonyms`, then the targets of
    /// `object_ids`.
    ///
    /// If a synonym or object id is mapped to more than one symbol, the
    /// first mapping wins.
    ///
    /// # Errors
    ///
    /// [`AssocError::TooManyEntities`] if there are more symbols than
    /// the dense index can hold
    pub fn new<S, Y, O>(symbols: S, synonyms: Y, object_ids: O) -> AssocResult<Self>
    where
        S: IntoIterator<Item = ByteString>,
        Y: IntoIterator<Item = (ByteString, ByteString)>,
        O: IntoIterator<Item = (ByteString, ByteString)>,
    {
        let mut index = SymbolIndex::default();

        for symbol in symbols {
            index.assign(symbol)?;
        }

        for (synonym, symbol) in synonyms {
            let idx = index.assign(symbol)?;
            index.synonym_to_index.entry(synonym).or_insert(idx);
        }

        for (object_id, symbol) in object_ids {
            let idx = index.assign(symbol)?;
            if let Entry::Vacant(entry) = index.object_id_to_index.entry(object_id.clone()) {
                entry.insert(idx);
                let slot = &mut index.object_ids[idx as usize];
                if slot.is_empty() {
                    *slot = object_id;
                }
            }
        }

        Ok(index)
    }

    /// Builds the index from already computed mappings
    ///
    /// `symbols[i]` and `object_ids[i]` are the symbol and the primary
    /// object id of the entity `i`. Entities without an object id use an
    /// empty [`ByteString`].
    ///
    /// # Errors
    ///
    /// [`AssocError::InconsistentIndex`] if the array lengths differ from the
    /// number of symbols, if `symbol_to_index` does not point every symbol to
    /// its own position or if any map contains an index out of bounds.
    /// [`AssocError::TooManyEntities`] if there are too many symbols.
    pub fn from_parts(
        symbols: Vec<ByteString>,
        object_ids: Vec<ByteString>,
        symbol_to_index: HashMap<ByteString, u32>,
        object_id_to_index: HashMap<ByteString, u32>,
        synonym_to_index: HashMap<ByteString, u32>,
    ) -> AssocResult<Self> {
        if symbols.len() >= NOT_FOUND as usize {
            return Err(AssocError::TooManyEntities);
        }
        if symbols.len() != object_ids.len() || symbols.len() != symbol_to_index.len() {
            return Err(AssocError::InconsistentIndex(format!(
                "{} symbols, {} object ids, {} symbol mappings",
                symbols.len(),
                object_ids.len(),
                symbol_to_index.len()
            )));
        }
        for (idx, symbol) in symbols.iter().enumerate() {
            if symbol_to_index.get(symbol).map(|i| *i as usize) != Some(idx) {
                return Err(AssocError::InconsistentIndex(format!(
                    "symbol {symbol} is not mapped to {idx}"
                )));
            }
        }
        let len = symbols.len();
        for (key, idx) in object_id_to_index.iter().chain(synonym_to_index.iter()) {
            if *idx as usize >= len {
                return Err(AssocError::InconsistentIndex(format!(
                    "{key} is mapped to {idx}, but only {len} symbols exist"
                )));
            }
        }

        Ok(Self {
            symbols,
            object_ids,
            symbol_to_index,
            object_id_to_index,
            synonym_to_index,
        })
    }

    /// Returns the index of `symbol`, adding it if not yet present
    fn assign(&mut self, symbol: ByteString) -> AssocResult<u32> {
        if let Some(idx) = self.symbol_to_index.get(&symbol) {
            return Ok(*idx);
        }
        let idx = u32::try_from(self.symbols.len())
            .ok()
            .filter(|idx| *idx < NOT_FOUND)
            .ok_or(AssocError::TooManyEntities)?;
        self.symbols.push(symbol.clone());
        self.object_ids.push(ByteString::default());
        self.symbol_to_index.insert(symbol, idx);
        Ok(idx)
    }

    fn find(map: &HashMap<ByteString, u32>, key: &ByteString) -> Option<EntityIndex> {
        map.get(key).map(|inner| EntityIndex { inner: *inner })
    }

    pub(crate) fn find_symbol(&self, key: &ByteString) -> Option<EntityIndex> {
        Self::find(&self.symbol_to_index, key)
    }

    pub(crate) fn find_object_id(&self, key: &ByteString) -> Option<EntityIndex> {
        Self::find(&self.object_id_to_index, key)
    }

    pub(crate) fn find_synonym(&self, key: &ByteString) -> Option<EntityIndex> {
        Self::find(&self.synonym_to_index, key)
    }

    /// Returns the index of the entity with the symbol `key`
    pub fn map_symbol<K: AsRef<[u8]>>(&self, key: K) -> Option<EntityIndex> {
        self.find_symbol(&ByteString::new(key.as_ref()))
    }

    /// Returns the index of the entity with the object id `key`
    pub fn map_object_id<K: AsRef<[u8]>>(&self, key: K) -> Option<EntityIndex> {
        self.find_object_id(&ByteString::new(key.as_ref()))
    }

    /// Returns the index of the entity with the synonym `key`
    pub fn map_synonym<K: AsRef<[u8]>>(&self, key: K) -> Option<EntityIndex> {
        self.find_synonym(&ByteString::new(key.as_ref()))
    }

    /// All symbols, ordered by their [`EntityIndex`]
    pub fn symbols(&self) -> &[ByteString] {
        &self.symbols
    }

    /// Returns the symbol of the entity `idx`
    pub fn symbol(&self, idx: EntityIndex) -> Option<&ByteString> {
        self.symbols.get(idx.as_usize())
    }

    /// Returns the primary object id of the entity `idx`
    ///
    /// Entities without any object id return an empty [`ByteString`].
    pub fn object_id(&self, idx: EntityIndex) -> Option<&ByteString> {
        self.object_ids.get(idx.as_usize())
    }

    /// Returns the number of distinct symbols
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` if the index contains no symbols
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Returns the number of object id keys
    pub fn object_id_count(&self) -> usize {
        self.object_id_to_index.len()
    }

    /// Returns the number of synonym keys
    pub fn synonym_count(&self) -> usize {
        self.synonym_to_index.len()
    }
}
