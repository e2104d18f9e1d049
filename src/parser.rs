//! Parsing of annotation files
//!
//! Two file formats are supported:
//!
//! - **GAF-like** annotation files with 14 tab separated columns, e.g. the
//!   `phenotype_annotation.tab` file of the HPO. Comment lines at the top
//!   start with `#`.
//! - **IDS** files, starting with the line `GoStat IDs Format Version 1.0`,
//!   followed by lines of `symbol<TAB>comma separated terms`.
//!
//! The format is detected from the file name (`*.ids`) or, if the name is
//! not conclusive, from the first non-comment line.
use std::collections::HashSet;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

use tracing::info;

use crate::bytestring::trim;
use crate::{
    AnnotationIndex, AnnotationRecord, AssocError, AssocResult, ByteString, SymbolIndex,
    TermLookup, DEFAULT_CHUNK_SIZE, DEFAULT_TERM_PREFIX, IDS_HEADER,
};

mod gaf;
mod ids;
pub mod scanner;

use scanner::LineScanner;

/// The format of an annotation file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Not yet known, will be detected from the content
    Unknown,
    /// `GoStat IDs` format
    Ids,
    /// GAF-like, tab separated annotation file
    Gaf,
}

impl FileKind {
    /// Guesses the format from a file name
    ///
    /// Only IDS files can be recognized by their name (`*.ids`, ignoring
    /// case), all other files remain [`FileKind::Unknown`] until their
    /// content is checked.
    pub fn from_name(name: &str) -> Self {
        const SUFFIX: &str = ".ids";
        let name = name.as_bytes();
        if name.len() >= SUFFIX.len()
            && name[name.len() - SUFFIX.len()..].eq_ignore_ascii_case(SUFFIX.as_bytes())
        {
            FileKind::Ids
        } else {
            FileKind::Unknown
        }
    }
}

impl Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                FileKind::Unknown => "unknown",
                FileKind::Ids => "IDS",
                FileKind::Gaf => "GAF",
            }
        )
    }
}

/// Filters and settings for the [`AnnotationParser`]
///
/// # Examples
///
/// ```
/// use hpo_assoc::ParserOptions;
///
/// let options = ParserOptions::default()
///     .with_evidence_codes(["IEA", "TAS"])
///     .with_names(["100050", "OMIM:100070"])
///     .exclude_not(false);
/// ```
#[derive(Debug, Clone)]
pub struct ParserOptions {
    names: Option<HashSet<ByteString>>,
    evidence_codes: Option<HashSet<ByteString>>,
    exclude_not: bool,
    default_prefix: String,
    chunk_size: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            names: None,
            evidence_codes: None,
            exclude_not: true,
            default_prefix: DEFAULT_TERM_PREFIX.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ParserOptions {
    /// Only keep annotations of these entities
    ///
    /// An annotation is kept if its accession, its database qualified
    /// accession (`OMIM:100050`), its name or one of its synonyms is
    /// in `names`.
    #[must_use]
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ByteString>,
    {
        self.names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Only keep annotations with one of these evidence codes
    ///
    /// This filter does not apply to IDS files, which have no evidence codes.
    #[must_use]
    pub fn with_evidence_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ByteString>,
    {
        self.evidence_codes = Some(codes.into_iter().map(Into::into).collect());
        self
    }

    /// Drop annotations with a `NOT` qualifier (default: `true`)
    #[must_use]
    pub fn exclude_not(mut self, exclude: bool) -> Self {
        self.exclude_not = exclude;
        self
    }

    /// Prefix for bare numeric terms of IDS files (default: `HP`)
    #[must_use]
    pub fn with_default_prefix(mut self, prefix: &str) -> Self {
        self.default_prefix = prefix.to_string();
        self
    }

    /// Number of bytes to read at once
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    fn accepts_evidence(&self, evidence: &[u8]) -> bool {
        self.evidence_codes
            .as_ref()
            .map_or(true, |codes| codes.contains(&ByteString::new(evidence)))
    }

    fn accepts_any_name<'a, I>(&self, mut keys: I) -> bool
    where
        I: Iterator<Item = &'a [u8]>,
    {
        self.names.as_ref().map_or(true, |names| {
            keys.any(|key| names.contains(&ByteString::new(key)))
        })
    }
}

/// Counters collected while parsing a file
///
/// Every data line (not empty, no comment) is counted as `good`. Each of
/// them is either `kept`, `skipped` by a filter or `bad`:
/// `kept + skipped + bad == good`.
///
/// Filters are applied in a fixed order and only the first filter that
/// rejects a line is counted: name, `NOT` qualifier, evidence code,
/// obsolete term.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseStats {
    /// Number of data lines
    pub good: usize,
    /// Lines that produced at least one kept annotation
    pub kept: usize,
    /// Malformed lines
    pub bad: usize,
    /// Lines removed by any filter
    pub skipped: usize,
    /// Lines removed because of a `NOT` qualifier
    pub nots: usize,
    /// Lines removed because their term is unknown to the ontology
    pub obsolete: usize,
    /// Lines removed because of their evidence code
    pub evidence_mismatch: usize,
    /// Lines removed by the name filter
    pub name_mismatch: usize,
    /// Terms of IDS files that are invalid or unknown to the ontology
    pub unknown_terms: usize,
    /// Comment lines before the first data line
    pub header_lines: usize,
}

impl Display for ParseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "good={} kept={} bad={} skipped={} (nots={} obsolete={} evidence_mismatch={} name_mismatch={}) unknown_terms={}",
            self.good,
            self.kept,
            self.bad,
            self.skipped,
            self.nots,
            self.obsolete,
            self.evidence_mismatch,
            self.name_mismatch,
            self.unknown_terms
        )
    }
}

/// The result of parsing one annotation file
#[derive(Debug, Clone)]
pub struct ParsedAnnotations {
    /// The detected format
    pub kind: FileKind,
    /// All kept annotations in file order
    pub records: Vec<AnnotationRecord>,
    /// Symbols, object ids and synonyms of all entities with kept annotations
    pub symbols: SymbolIndex,
    /// Diagnostic counters
    pub stats: ParseStats,
}

impl ParsedAnnotations {
    /// Builds the [`AnnotationIndex`] of all records
    pub fn into_index(self) -> AnnotationIndex {
        AnnotationIndex::new(self.records, self.symbols)
    }

    /// Builds the [`AnnotationIndex`] from copies of the parsed records
    pub fn index(&self) -> AnnotationIndex {
        AnnotationIndex::new(self.records.iter().cloned(), self.symbols.clone())
    }
}

/// Collects the keys of all entities with kept annotations
///
/// The accession of a record is its symbol, the database qualified
/// accession its object id, and the name and all synonyms are synonyms.
/// Every key is only recorded the first time it is seen.
#[derive(Debug, Default)]
pub(crate) struct SymbolCollector {
    symbols: Vec<ByteString>,
    synonyms: Vec<(ByteString, ByteString)>,
    object_ids: Vec<(ByteString, ByteString)>,
    seen_symbols: HashSet<ByteString>,
    seen_synonyms: HashSet<ByteString>,
    seen_object_ids: HashSet<ByteString>,
}

impl SymbolCollector {
    pub fn add_symbol(&mut self, symbol: &ByteString) {
        if self.seen_symbols.insert(symbol.clone()) {
            self.symbols.push(symbol.clone());
        }
    }

    pub fn add_synonym(&mut self, synonym: &[u8], symbol: &ByteString) {
        if synonym.is_empty() || synonym == symbol.as_bytes() {
            return;
        }
        let synonym = ByteString::new(synonym);
        if self.seen_synonyms.insert(synonym.clone()) {
            self.synonyms.push((synonym, symbol.clone()));
        }
    }

    pub fn add_object_id(&mut self, object_id: ByteString, symbol: &ByteString) {
        if self.seen_object_ids.insert(object_id.clone()) {
            self.object_ids.push((object_id, symbol.clone()));
        }
    }

    /// Records all keys of a GAF record
    pub fn add_record(&mut self, record: &AnnotationRecord) {
        let symbol = record.object_id();
        self.add_symbol(symbol);
        if !record.database().is_empty() {
            let mut qualified = Vec::with_capacity(record.database().len() + 1 + symbol.len());
            qualified.extend_from_slice(record.database().as_bytes());
            qualified.push(b':');
            qualified.extend_from_slice(symbol.as_bytes());
            self.add_object_id(ByteString::new(&qualified), symbol);
        }
        self.add_synonym(record.object_name().as_bytes(), symbol);
        for synonym in record.synonyms() {
            self.add_synonym(synonym, symbol);
        }
    }

    pub fn into_index(self) -> AssocResult<SymbolIndex> {
        SymbolIndex::new(self.symbols, self.synonyms, self.object_ids)
    }
}

/// Settings shared by the GAF and IDS parsing routines
struct ParseContext<'a> {
    options: &'a ParserOptions,
    terms: Option<&'a dyn TermLookup>,
    source_name: &'a str,
}

impl ParseContext<'_> {
    fn read_failed(&self, source: std::io::Error) -> AssocError {
        AssocError::ReadFailed {
            source_name: self.source_name.to_string(),
            source,
        }
    }
}

/// Parses GAF-like and IDS annotation files
///
/// The parser owns its input stream and drops (closes) it when parsing
/// is done, successful or not.
///
/// # Examples
///
/// ```
/// use hpo_assoc::{AnnotationParser, FileKind, ParserOptions};
///
/// let data = "GoStat IDs Format Version 1.0\ngeneA\tHP:0000028,175\n";
///
/// let mut parser = AnnotationParser::from_reader(
///     data.as_bytes(),
///     "genes.ids",
///     ParserOptions::default(),
///     None,
/// );
/// parser.parse().unwrap();
///
/// assert_eq!(parser.kind(), FileKind::Ids);
/// assert_eq!(parser.records().len(), 2);
/// assert_eq!(parser.records()[1].term_id().to_string(), "HP:0000175");
/// ```
pub struct AnnotationParser<'t, R> {
    source: Option<R>,
    source_name: String,
    kind: FileKind,
    options: ParserOptions,
    terms: Option<&'t dyn TermLookup>,
    result: Option<ParsedAnnotations>,
}

impl<'t> AnnotationParser<'t, File> {
    /// Opens and parses the annotation file at `path`
    ///
    /// If `terms` is given, annotations to terms that are not part of it
    /// are removed (see [`TermLookup`]).
    ///
    /// # Errors
    ///
    /// - [`AssocError::CannotOpenFile`]: the file does not exist or can't be opened
    /// - [`AssocError::ReadFailed`]: reading from the file failed
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        options: ParserOptions,
        terms: Option<&'t dyn TermLookup>,
    ) -> AssocResult<Self> {
        let mut parser = Self::iterative_from_path(path, options, terms)?;
        parser.parse()?;
        Ok(parser)
    }

    /// Opens the annotation file at `path`, but does not parse it yet
    ///
    /// Parsing starts with the first call of [`AnnotationParser::parse`].
    ///
    /// # Errors
    ///
    /// [`AssocError::CannotOpenFile`]: the file does not exist or can't be opened
    pub fn iterative_from_path<P: AsRef<Path>>(
        path: P,
        options: ParserOptions,
        terms: Option<&'t dyn TermLookup>,
    ) -> AssocResult<Self> {
        let filename = path.as_ref().display().to_string();
        let file = File::open(path).map_err(|_| AssocError::CannotOpenFile(filename.clone()))?;
        Ok(Self::from_reader(file, filename, options, terms))
    }
}

impl<'t, R: Read> AnnotationParser<'t, R> {
    /// Creates a parser for the data of `reader`
    ///
    /// `name` is used to detect the format and in error messages.
    /// Parsing starts with the first call of [`AnnotationParser::parse`].
    pub fn from_reader<S: Into<String>>(
        reader: R,
        name: S,
        options: ParserOptions,
        terms: Option<&'t dyn TermLookup>,
    ) -> Self {
        let source_name = name.into();
        Self {
            source: Some(reader),
            kind: FileKind::from_name(&source_name),
            source_name,
            options,
            terms,
            result: None,
        }
    }

    /// Parses the input
    ///
    /// Malformed and filtered lines do not cause an error, they are counted
    /// in the [`ParseStats`]. Calling `parse` again after it succeeded
    /// does nothing.
    ///
    /// # Errors
    ///
    /// - [`AssocError::ReadFailed`]: reading from the input failed
    /// - [`AssocError::TooManyEntities`]: the file contains too many entities
    /// - [`AssocError::InvalidInput`]: a previous call failed and the input is gone
    pub fn parse(&mut self) -> AssocResult<()> {
        if self.result.is_some() {
            return Ok(());
        }
        let Some(reader) = self.source.take() else {
            return Err(AssocError::InvalidInput(format!(
                "{} was already consumed by a failed parse",
                self.source_name
            )));
        };

        let ctx = ParseContext {
            options: &self.options,
            terms: self.terms,
            source_name: &self.source_name,
        };

        let parsed = match self.kind {
            FileKind::Ids => ids::parse(BufReader::new(reader), true, 0, &ctx)?,
            FileKind::Gaf | FileKind::Unknown => detect_and_parse(reader, &ctx)?,
        };

        info!("Parsed {} ({}): {}", self.source_name, parsed.kind, parsed.stats);
        self.kind = parsed.kind;
        self.result = Some(parsed);
        Ok(())
    }

    /// Returns `true` once the input is parsed
    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    /// The format of the input
    ///
    /// Returns [`FileKind::Unknown`] if the format can only be detected
    /// from the content and parsing has not started yet.
    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// The name of the input, used in log and error messages
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// The kept annotations, empty before parsing
    pub fn records(&self) -> &[AnnotationRecord] {
        self.result
            .as_ref()
            .map_or(&[], |parsed| parsed.records.as_slice())
    }

    /// The [`SymbolIndex`] of all kept annotations, `None` before parsing
    pub fn symbols(&self) -> Option<&SymbolIndex> {
        self.result.as_ref().map(|parsed| &parsed.symbols)
    }

    /// The diagnostic counters, `None` before parsing
    pub fn stats(&self) -> Option<&ParseStats> {
        self.result.as_ref().map(|parsed| &parsed.stats)
    }

    /// Parses the input, if not yet done, and returns the result
    ///
    /// # Errors
    ///
    /// Same as [`AnnotationParser::parse`]
    pub fn into_parsed(mut self) -> AssocResult<ParsedAnnotations> {
        self.parse()?;
        self.result.ok_or_else(|| {
            AssocError::InvalidInput(format!("{} was not parsed", self.source_name))
        })
    }
}

/// Skips the comment header and parses the rest as IDS or GAF file,
/// depending on the first data line
fn detect_and_parse<R: Read>(reader: R, ctx: &ParseContext<'_>) -> AssocResult<ParsedAnnotations> {
    let mut scanner = LineScanner::with_chunk_size(reader, ctx.options.chunk_size);
    let mut header_lines = 0usize;
    let mut lines_seen = 0usize;
    let mut first_line: Option<Vec<u8>> = None;

    scanner
        .scan(|line| {
            lines_seen += 1;
            if line.starts_with(b"#") {
                header_lines += 1;
                return true;
            }
            if trim(line).is_empty() {
                return true;
            }
            first_line = Some(line.to_vec());
            false
        })
        .map_err(|err| ctx.read_failed(err))?;

    let (reader, rest) = scanner.into_parts();

    if first_line
        .as_deref()
        .is_some_and(|line| trim(line) == IDS_HEADER.as_bytes())
    {
        let body = BufReader::new(Cursor::new(rest).chain(reader));
        let mut parsed = ids::parse(body, false, lines_seen, ctx)?;
        parsed.stats.header_lines += header_lines + 1;
        return Ok(parsed);
    }

    let mut parsed = gaf::parse(first_line.as_deref(), lines_seen, rest, reader, ctx)?;
    parsed.stats.header_lines = header_lines;
    Ok(parsed)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{TermCatalog, TermId};

    const AARSKOG: &str = "OMIM\t100050\t100050 AARSKOG SYNDROME\t\tHP:0000028\tOMIM:100050\tIEA\t\t\t\tO\t\t2009.07.24\tHPO:skoehler";

    fn parse_str(data: &str, name: &str, options: ParserOptions) -> ParsedAnnotations {
        AnnotationParser::from_reader(data.as_bytes(), name, options, None)
            .into_parsed()
            .expect("parsing from memory never fails")
    }

    #[test]
    fn single_gaf_line() {
        let data = format!("#comment\n{AARSKOG}\n");
        let parsed = parse_str(&data, "annotations.tab", ParserOptions::default());

        assert_eq!(parsed.kind, FileKind::Gaf);
        assert_eq!(parsed.records.len(), 1);
        let record = &parsed.records[0];
        assert_eq!(record.object_id(), "100050");
        assert_eq!(record.term_id().to_string(), "HP:0000028");
        assert_eq!(record.evidence(), "IEA");
        assert!(!record.not_qualifier());

        assert_eq!(parsed.stats.header_lines, 1);
        assert_eq!(parsed.stats.good, 1);
        assert_eq!(parsed.stats.kept, 1);
        assert_eq!(parsed.symbols.len(), 1);
    }

    #[test]
    fn not_qualified_gaf_line() {
        let data = format!("#comment\n{}\n", AARSKOG.replacen("\t\tHP:", "\tNOT\tHP:", 1));
        let parsed = parse_str(&data, "annotations.tab", ParserOptions::default());
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.stats.nots, 1);
        assert_eq!(parsed.stats.skipped, 1);
        assert!(parsed.symbols.is_empty());

        let parsed = parse_str(&data, "annotations.tab", ParserOptions::default().exclude_not(false));
        assert_eq!(parsed.records.len(), 1);
        assert!(parsed.records[0].not_qualifier());
        assert_eq!(parsed.stats.nots, 0);
    }

    #[test]
    fn ids_by_name() {
        let data = format!("{IDS_HEADER}\ngeneA\tHP:0000028,HP:0000175\n");
        let parsed = parse_str(&data, "genes.ids", ParserOptions::default());
        assert_eq!(parsed.kind, FileKind::Ids);
        assert_eq!(parsed.records.len(), 2);
        assert!(parsed.records.iter().all(|r| r.object_id() == "geneA"));
    }

    #[test]
    fn ids_by_upper_case_name_without_header() {
        let parsed = parse_str("geneA\tHP:0000028\n", "GENES.IDS", ParserOptions::default());
        assert_eq!(parsed.kind, FileKind::Ids);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.stats.bad, 0);
    }

    #[test]
    fn ids_by_content() {
        let data = format!("{IDS_HEADER}\r\ngeneA\t28,175\r\ngeneB\tHP:0000001\r\n");
        let parsed = parse_str(&data, "genes.txt", ParserOptions::default());
        assert_eq!(parsed.kind, FileKind::Ids);
        assert_eq!(parsed.records.len(), 3);
        assert_eq!(parsed.stats.good, 2);
        assert_eq!(parsed.stats.header_lines, 1);
        assert_eq!(parsed.records[1].term_id(), &TermId::new("HP", 175));
    }

    #[test]
    fn ids_with_catalog() {
        let catalog: TermCatalog = [TermId::new("HP", 28), TermId::new("HP", 175)]
            .into_iter()
            .collect();
        let data = format!("{IDS_HEADER}\ngeneA\tHP:0000028,HP:0000175\n");
        let parsed = AnnotationParser::from_reader(
            data.as_bytes(),
            "genes.ids",
            ParserOptions::default(),
            Some(&catalog),
        )
        .into_parsed()
        .unwrap();
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.stats.unknown_terms, 0);
    }

    #[test]
    fn parse_is_idempotent() {
        let data = format!("{AARSKOG}\n{AARSKOG}\n");
        let mut parser = AnnotationParser::from_reader(
            data.as_bytes(),
            "annotations.tab",
            ParserOptions::default(),
            None,
        );
        assert!(!parser.is_finished());
        assert_eq!(parser.kind(), FileKind::Unknown);
        assert!(parser.records().is_empty());
        assert!(parser.stats().is_none());

        parser.parse().unwrap();
        parser.parse().unwrap();
        assert!(parser.is_finished());
        assert_eq!(parser.kind(), FileKind::Gaf);
        assert_eq!(parser.records().len(), 2);
        assert_eq!(parser.stats().unwrap().good, 2);
        assert_eq!(parser.symbols().unwrap().len(), 1);
    }

    #[test]
    fn failed_parse_cannot_be_repeated() {
        struct FailingReader;
        impl Read for FailingReader {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"))
            }
        }

        let mut parser = AnnotationParser::from_reader(
            FailingReader,
            "broken.tab",
            ParserOptions::default(),
            None,
        );
        let err = parser.parse().unwrap_err();
        assert!(matches!(err, AssocError::ReadFailed { ref source_name, .. } if source_name == "broken.tab"));
        assert!(parser.parse().is_err());
        assert!(!parser.is_finished());
    }

    #[test]
    fn empty_input() {
        let parsed = parse_str("", "annotations.tab", ParserOptions::default());
        assert_eq!(parsed.kind, FileKind::Gaf);
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.stats, ParseStats::default());

        let parsed = parse_str("#only\n#comments", "annotations.tab", ParserOptions::default());
        assert_eq!(parsed.stats.header_lines, 2);
        assert_eq!(parsed.stats.good, 0);
    }

    #[test]
    fn missing_file() {
        let res = AnnotationParser::from_path("does/not/exist.tab", ParserOptions::default(), None);
        assert!(matches!(res, Err(AssocError::CannotOpenFile(_))));
    }

    #[test]
    fn file_kind_from_name() {
        assert_eq!(FileKind::from_name("genes.ids"), FileKind::Ids);
        assert_eq!(FileKind::from_name("GENES.IDS"), FileKind::Ids);
        assert_eq!(FileKind::from_name("genes.Ids"), FileKind::Ids);
        assert_eq!(FileKind::from_name("ids"), FileKind::Unknown);
        assert_eq!(FileKind::from_name("phenotype_annotation.tab"), FileKind::Unknown);
        assert_eq!(FileKind::Gaf.to_string(), "GAF");
    }

    #[test]
    fn stats_summary() {
        let stats = ParseStats {
            good: 3,
            kept: 1,
            bad: 1,
            skipped: 1,
            nots: 1,
            ..Default::default()
        };
        assert_eq!(
            stats.to_string(),
            "good=3 kept=1 bad=1 skipped=1 (nots=1 obsolete=0 evidence_mismatch=0 name_mismatch=0) unknown_terms=0"
        );
    }
}
