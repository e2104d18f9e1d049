use std::fmt::Display;

use crate::bytestring::{trim, ByteString, ByteStringPool};
use crate::term::{PrefixPool, TermId};
use crate::{AssocError, AssocResult, GAF_COLUMNS};

/// Column positions of the GAF-like annotation format
mod column {
    pub const DATABASE: usize = 0;
    pub const OBJECT_ID: usize = 1;
    pub const OBJECT_NAME: usize = 2;
    pub const QUALIFIER: usize = 3;
    pub const TERM_ID: usize = 4;
    pub const DB_REFERENCE: usize = 5;
    pub const EVIDENCE: usize = 6;
    pub const ONSET: usize = 7;
    pub const FREQUENCY: usize = 8;
    pub const SYNONYM: usize = 11;
    pub const DATE: usize = 12;
    pub const ASSIGNED_BY: usize = 13;
}

/// The tab separated columns of one GAF-like line
///
/// Splitting only stores the positions of the columns inside the line.
/// No field is copied until a record is actually built from it, so lines
/// that are filtered out never allocate.
///
/// ```text
/// OMIM  100050  100050 AARSKOG SYNDROME    HP:0000028  OMIM:100050  IEA  ...  O    2009.07.24  HPO:skoehler
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GafFields<'l> {
    fields: [&'l [u8]; GAF_COLUMNS],
}

impl<'l> GafFields<'l> {
    /// Splits `line` at every tab
    ///
    /// A trailing carriage return is ignored. Columns beyond the 14th are
    /// tolerated and ignored.
    ///
    /// # Errors
    ///
    /// [`AssocError::InvalidInput`] if the line has less than
    /// [`GAF_COLUMNS`] columns or the object accession is empty
    pub fn split(line: &'l [u8]) -> AssocResult<Self> {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let empty: &'l [u8] = &[];
        let mut fields = [empty; GAF_COLUMNS];
        let mut count = 0;
        for (idx, field) in line.split(|b| *b == b'\t').take(GAF_COLUMNS).enumerate() {
            fields[idx] = field;
            count += 1;
        }

        if count < GAF_COLUMNS {
            return Err(AssocError::InvalidInput(format!(
                "expected {GAF_COLUMNS} columns, found {count}"
            )));
        }
        if trim(fields[column::OBJECT_ID]).is_empty() {
            return Err(AssocError::InvalidInput("missing object accession".to_string()));
        }
        Ok(Self { fields })
    }

    fn get(&self, column: usize) -> &'l [u8] {
        trim(self.fields[column])
    }

    /// Source database, e.g. `OMIM`
    pub fn database(&self) -> &'l [u8] {
        self.get(column::DATABASE)
    }

    /// Accession of the object within the database, e.g. `100050`
    pub fn object_id(&self) -> &'l [u8] {
        self.get(column::OBJECT_ID)
    }

    /// Display name of the object
    pub fn object_name(&self) -> &'l [u8] {
        self.get(column::OBJECT_NAME)
    }

    /// The raw, pipe separated qualifier column
    pub fn qualifier(&self) -> &'l [u8] {
        self.get(column::QUALIFIER)
    }

    /// The evidence code, e.g. `IEA`
    pub fn evidence(&self) -> &'l [u8] {
        self.get(column::EVIDENCE)
    }

    /// The date of the annotation as `YYYY.MM.DD`
    pub fn date(&self) -> &'l [u8] {
        self.get(column::DATE)
    }

    /// The authority that assigned the annotation
    pub fn assigned_by(&self) -> &'l [u8] {
        self.get(column::ASSIGNED_BY)
    }

    /// Returns `true` if any qualifier token is `NOT` (ignoring case)
    pub fn is_not_qualified(&self) -> bool {
        self.qualifier()
            .split(|b| *b == b'|')
            .any(|token| trim(token).eq_ignore_ascii_case(b"NOT"))
    }

    /// Iterates the non-empty, pipe separated synonyms
    pub fn synonyms(&self) -> impl Iterator<Item = &'l [u8]> {
        self.get(column::SYNONYM)
            .split(|b| *b == b'|')
            .map(trim)
            .filter(|synonym| !synonym.is_empty())
    }

    /// Parses the term id column
    ///
    /// # Errors
    ///
    /// [`AssocError::InvalidInput`] if the column is not a valid [`TermId`]
    pub fn term_id(&self, pool: &mut PrefixPool) -> AssocResult<TermId> {
        TermId::parse(self.get(column::TERM_ID), pool)
    }
}

/// A single annotation, linking one object (disease) to one term
///
/// All text fields are stored as [`ByteString`]s. Optional columns that are
/// empty in the source file are empty [`ByteString`]s.
///
/// # Examples
///
/// ```
/// use hpo_assoc::{AnnotationRecord, PrefixPool};
///
/// let line = b"OMIM\t100050\t100050 AARSKOG SYNDROME\t\tHP:0000028\tOMIM:100050\tIEA\t\t\t\tO\t\t2009.07.24\tHPO:skoehler";
/// let record = AnnotationRecord::from_gaf_line(line, &mut PrefixPool::new()).unwrap();
///
/// assert_eq!(record.database(), "OMIM");
/// assert_eq!(record.object_id(), "100050");
/// assert_eq!(record.term_id().to_string(), "HP:0000028");
/// assert_eq!(record.evidence(), "IEA");
/// assert!(!record.not_qualifier());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRecord {
    database: ByteString,
    object_id: ByteString,
    object_name: ByteString,
    not_qualifier: bool,
    term_id: TermId,
    db_reference: ByteString,
    evidence: ByteString,
    onset: ByteString,
    frequency: ByteString,
    synonym: ByteString,
}

impl AnnotationRecord {
    /// Constructs a new record of `object_id` to `term_id`
    ///
    /// All other fields are empty. Use the `with_*` methods to fill them.
    pub fn new<I: Into<ByteString>>(object_id: I, term_id: TermId) -> Self {
        Self {
            database: ByteString::default(),
            object_id: object_id.into(),
            object_name: ByteString::default(),
            not_qualifier: false,
            term_id,
            db_reference: ByteString::default(),
            evidence: ByteString::default(),
            onset: ByteString::default(),
            frequency: ByteString::default(),
            synonym: ByteString::default(),
        }
    }

    /// Parses a complete line of a GAF-like file
    ///
    /// # Errors
    ///
    /// [`AssocError::InvalidInput`] if the line has too few columns, no
    /// object accession or an invalid term id
    pub fn from_gaf_line(line: &[u8], pool: &mut PrefixPool) -> AssocResult<Self> {
        let fields = GafFields::split(line)?;
        let term_id = fields.term_id(pool)?;
        Ok(Self::from_gaf_fields(&fields, term_id, &mut ByteStringPool::new()))
    }

    /// Builds the record from already split columns
    ///
    /// The term id is passed separately, because it must be parsed
    /// (and validated) before filters are applied. All text columns are
    /// interned in `strings`, so records of the same disease share the
    /// storage of their name and synonyms.
    pub(crate) fn from_gaf_fields(
        fields: &GafFields<'_>,
        term_id: TermId,
        strings: &mut ByteStringPool,
    ) -> Self {
        Self {
            database: strings.intern(fields.database()),
            object_id: strings.intern(fields.object_id()),
            object_name: strings.intern(fields.object_name()),
            not_qualifier: fields.is_not_qualified(),
            term_id,
            db_reference: strings.intern(fields.get(column::DB_REFERENCE)),
            evidence: strings.intern(fields.evidence()),
            onset: strings.intern(fields.get(column::ONSET)),
            frequency: strings.intern(fields.get(column::FREQUENCY)),
            synonym: strings.intern(fields.get(column::SYNONYM)),
        }
    }

    /// Sets the source database
    #[must_use]
    pub fn with_database<I: Into<ByteString>>(mut self, database: I) -> Self {
        self.database = database.into();
        self
    }

    /// Sets the display name
    #[must_use]
    pub fn with_object_name<I: Into<ByteString>>(mut self, name: I) -> Self {
        self.object_name = name.into();
        self
    }

    /// Sets the evidence code
    #[must_use]
    pub fn with_evidence<I: Into<ByteString>>(mut self, evidence: I) -> Self {
        self.evidence = evidence.into();
        self
    }

    /// Sets the (pipe separated) synonyms
    #[must_use]
    pub fn with_synonym<I: Into<ByteString>>(mut self, synonym: I) -> Self {
        self.synonym = synonym.into();
        self
    }

    /// Marks the record as `NOT` qualified
    #[must_use]
    pub fn with_not_qualifier(mut self, not_qualifier: bool) -> Self {
        self.not_qualifier = not_qualifier;
        self
    }

    /// Source database, e.g. `OMIM`
    pub fn database(&self) -> &ByteString {
        &self.database
    }

    /// Accession within the database, the primary key of the object
    pub fn object_id(&self) -> &ByteString {
        &self.object_id
    }

    /// Free text display name of the object
    pub fn object_name(&self) -> &ByteString {
        &self.object_name
    }

    /// `true` if the annotation is negated
    pub fn not_qualifier(&self) -> bool {
        self.not_qualifier
    }

    /// The annotated term
    pub fn term_id(&self) -> &TermId {
        &self.term_id
    }

    /// Replaces the annotated term, e.g. with the primary id of an
    /// alternative id
    pub(crate) fn set_term_id(&mut self, term_id: TermId) {
        self.term_id = term_id;
    }

    /// Database cross reference, e.g. `PMID:31675180`
    pub fn db_reference(&self) -> &ByteString {
        &self.db_reference
    }

    /// Evidence code, e.g. `IEA`
    pub fn evidence(&self) -> &ByteString {
        &self.evidence
    }

    /// Onset modifier term id
    pub fn onset(&self) -> &ByteString {
        &self.onset
    }

    /// Frequency modifier term id
    pub fn frequency(&self) -> &ByteString {
        &self.frequency
    }

    /// The raw synonym column
    pub fn synonym(&self) -> &ByteString {
        &self.synonym
    }

    /// Iterates the individual, pipe separated synonyms
    pub fn synonyms(&self) -> impl Iterator<Item = &[u8]> {
        self.synonym
            .as_bytes()
            .split(|b| *b == b'|')
            .map(trim)
            .filter(|synonym| !synonym.is_empty())
    }
}

impl Display for AnnotationRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.database.is_empty() {
            write!(f, "{}", self.object_id)?;
        } else {
            write!(f, "{}:{}", self.database, self.object_id)?;
        }
        if self.not_qualifier {
            write!(f, " NOT")?;
        }
        write!(f, " {}", self.term_id)
    }
}
