//! Parses HPO disease annotation files (GAF-like and IDS) and builds an
//! index to look up the annotated HPO terms of every disease.
//!
//! The crate is built around three steps:
//!
//! 1. [`AnnotationParser`] scans the file byte-wise and produces a flat
//!    list of [`AnnotationRecord`]s together with a [`SymbolIndex`].
//! 2. The [`SymbolIndex`] assigns every disease a dense [`EntityIndex`] and
//!    maps symbols, object ids and synonyms to it.
//! 3. [`AnnotationIndex`] groups the records per disease into
//!    [`EntityAnnotations`] and answers lookups by any of the three keys.
//!
//! # Examples
//!
//! ```
//! use hpo_assoc::{AnnotationParser, ParserOptions};
//!
//! let data = "#comment\n\
//!     OMIM\t100050\t100050 AARSKOG SYNDROME\t\tHP:0000028\tOMIM:100050\tIEA\t\t\t\tO\t\t2009.07.24\tHPO:skoehler\n";
//!
//! let mut parser = AnnotationParser::from_reader(
//!     data.as_bytes(),
//!     "phenotype_annotation.tab",
//!     ParserOptions::default(),
//!     None,
//! );
//! parser.parse().unwrap();
//! let index = parser.into_parsed().unwrap().into_index();
//!
//! let disease = index.lookup("OMIM:100050").unwrap();
//! assert_eq!(disease.id(), "100050");
//! assert_eq!(disease.len(), 1);
//! ```
#![warn(missing_docs)]
use std::num::ParseIntError;
use thiserror::Error;

pub mod annotations;
pub mod bytestring;
pub mod index;
pub mod parser;
pub mod term;

pub use annotations::{AnnotationRecord, EntityAnnotations};
pub use bytestring::{ByteString, ByteStringPool};
pub use index::{AnnotationIndex, EntityIndex, SymbolIndex};
pub use parser::{AnnotationParser, FileKind, ParseStats, ParsedAnnotations, ParserOptions};
pub use term::{PrefixPool, TermCatalog, TermId, TermLookup};

/// Number of bytes the [`parser::scanner::LineScanner`] reads per call
const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Number of tab separated columns of a GAF-like annotation line
pub const GAF_COLUMNS: usize = 14;

/// The first line of every IDS file
pub const IDS_HEADER: &str = "GoStat IDs Format Version 1.0";

/// Prefix used for bare numeric term ids in IDS files
pub const DEFAULT_TERM_PREFIX: &str = "HP";

/// Initial capacity of the per-file record vector
const DEFAULT_NUM_RECORDS: usize = 1_000;

/// Main Error type for this crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AssocError {
    /// Failed to open the annotation file
    #[error("cannot open file {0}")]
    CannotOpenFile(String),
    /// Reading from the underlying stream failed
    #[error("unable to read from {source_name}")]
    ReadFailed {
        /// Path or name of the stream
        source_name: String,
        /// The I/O error that aborted the parse
        #[source]
        source: std::io::Error,
    },
    /// Failed to parse an Integer
    #[error("unable to parse Integer")]
    ParseIntError,
    /// Failed to parse a field of an annotation line
    #[error("invalid input data: {0}")]
    InvalidInput(String),
    /// The parts of a [`SymbolIndex`] do not fit together
    #[error("inconsistent symbol index: {0}")]
    InconsistentIndex(String),
    /// More entities than the dense index can address
    #[error("too many entities for the symbol index")]
    TooManyEntities,
}

impl From<ParseIntError> for AssocError {
    fn from(_: ParseIntError) -> Self {
        AssocError::ParseIntError
    }
}

/// Shortcut for `Result<T, AssocError>`
pub type AssocResult<T> = Result<T, AssocError>;
