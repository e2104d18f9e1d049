//! Line processing of GAF-like annotation files
use std::io::Read;

use tracing::{debug, trace};

use crate::annotations::GafFields;
use crate::bytestring::{trim, ByteStringPool};
use crate::parser::scanner::LineScanner;
use crate::parser::{FileKind, ParseContext, ParseStats, ParsedAnnotations, SymbolCollector};
use crate::{AnnotationRecord, AssocResult, PrefixPool, DEFAULT_NUM_RECORDS};

/// Why a line did not make it into the result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Name,
    Not,
    Evidence,
    Obsolete,
}

struct GafLineProcessor<'c, 'a> {
    ctx: &'c ParseContext<'a>,
    pool: PrefixPool,
    strings: ByteStringPool,
    records: Vec<AnnotationRecord>,
    symbols: SymbolCollector,
    stats: ParseStats,
    line_number: usize,
}

impl<'c, 'a> GafLineProcessor<'c, 'a> {
    fn new(ctx: &'c ParseContext<'a>) -> Self {
        Self {
            ctx,
            pool: PrefixPool::new(),
            strings: ByteStringPool::new(),
            records: Vec::with_capacity(DEFAULT_NUM_RECORDS),
            symbols: SymbolCollector::default(),
            stats: ParseStats::default(),
            line_number: 0,
        }
    }

    /// Handles a single line, always returns `true` to continue scanning
    fn process(&mut self, line: &[u8]) -> bool {
        self.line_number += 1;
        if line.starts_with(b"#") || trim(line).is_empty() {
            return true;
        }
        self.stats.good += 1;

        match self.evaluate(line) {
            Ok(Ok(record)) => {
                self.stats.kept += 1;
                self.symbols.add_record(&record);
                self.records.push(record);
            }
            Ok(Err(rejection)) => {
                self.stats.skipped += 1;
                match rejection {
                    Rejection::Name => self.stats.name_mismatch += 1,
                    Rejection::Not => self.stats.nots += 1,
                    Rejection::Evidence => self.stats.evidence_mismatch += 1,
                    Rejection::Obsolete => self.stats.obsolete += 1,
                }
                trace!("Skipped line {}: {:?}", self.line_number, rejection);
            }
            Err(err) => {
                self.stats.bad += 1;
                debug!(
                    "Malformed line {} in {}: {}",
                    self.line_number, self.ctx.source_name, err
                );
            }
        }
        true
    }

    /// Parses the line and applies all filters
    ///
    /// The outer `Result` fails for malformed lines, the inner one holds
    /// the first filter that rejected the line.
    fn evaluate(&mut self, line: &[u8]) -> AssocResult<Result<AnnotationRecord, Rejection>> {
        let fields = GafFields::split(line)?;
        let term_id = fields.term_id(&mut self.pool)?;
        let options = self.ctx.options;

        if options.names.is_some() {
            let mut qualified = fields.database().to_vec();
            qualified.push(b':');
            qualified.extend_from_slice(fields.object_id());
            let keys = [fields.object_id(), qualified.as_slice(), fields.object_name()]
                .into_iter()
                .chain(fields.synonyms());
            if !options.accepts_any_name(keys) {
                return Ok(Err(Rejection::Name));
            }
        }

        if options.exclude_not && fields.is_not_qualified() {
            return Ok(Err(Rejection::Not));
        }

        if !options.accepts_evidence(fields.evidence()) {
            return Ok(Err(Rejection::Evidence));
        }

        let mut record = AnnotationRecord::from_gaf_fields(&fields, term_id, &mut self.strings);

        if let Some(terms) = self.ctx.terms {
            match terms.primary_id(record.term_id()) {
                None => return Ok(Err(Rejection::Obsolete)),
                Some(primary) if &primary != record.term_id() => {
                    debug!(
                        "Replacing alternative {} with {} in line {}",
                        record.term_id(),
                        primary,
                        self.line_number
                    );
                    record.set_term_id(primary);
                }
                Some(_) => {}
            }
        }

        Ok(Ok(record))
    }

    fn finish(self) -> AssocResult<ParsedAnnotations> {
        let symbols = self.symbols.into_index()?;
        debug!(
            "Collected {} records of {} entities from {}",
            self.records.len(),
            symbols.len(),
            self.ctx.source_name
        );
        Ok(ParsedAnnotations {
            kind: FileKind::Gaf,
            records: self.records,
            symbols,
            stats: self.stats,
        })
    }
}

/// Parses a GAF-like file
///
/// `first_line` is the first data line, already read while detecting the
/// format, as line number `first_line_number`. `rest` holds the bytes that
/// were read from `reader` but not yet scanned.
pub(super) fn parse<R: Read>(
    first_line: Option<&[u8]>,
    first_line_number: usize,
    rest: Vec<u8>,
    reader: R,
    ctx: &ParseContext<'_>,
) -> AssocResult<ParsedAnnotations> {
    let mut processor = GafLineProcessor::new(ctx);

    if let Some(line) = first_line {
        processor.line_number = first_line_number.saturating_sub(1);
        processor.process(line);
    }

    let mut scanner = LineScanner::with_chunk_size(reader, ctx.options.chunk_size);
    scanner.push(&rest);
    scanner
        .scan(|line| processor.process(line))
        .map_err(|err| ctx.read_failed(err))?;

    processor.finish()
}
