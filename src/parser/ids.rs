//! Line processing of `GoStat IDs` files
//!
//! ```text
//! GoStat IDs Format Version 1.0
//! geneA<TAB>HP:0000028,HP:0000175
//! geneB<TAB>1,118
//! ```
//!
//! Terms without prefix get the default prefix of the [`ParserOptions`](super::ParserOptions).
use std::io::BufRead;

use tracing::{debug, warn};

use crate::bytestring::trim;
use crate::parser::{FileKind, ParseContext, ParseStats, ParsedAnnotations, SymbolCollector};
use crate::{
    AnnotationRecord, AssocError, AssocResult, ByteString, PrefixPool, TermId, DEFAULT_NUM_RECORDS,
    IDS_HEADER,
};

/// Parses a single term of the comma separated list
fn parse_term(token: &[u8], default_prefix: &str, pool: &mut PrefixPool) -> AssocResult<TermId> {
    if token.contains(&b':') {
        return TermId::parse(token, pool);
    }
    if token.is_empty() || !token.iter().all(u8::is_ascii_digit) {
        return Err(AssocError::InvalidInput(format!(
            "invalid term {}",
            String::from_utf8_lossy(token)
        )));
    }
    let id = ByteString::parse_first_int(token)?;
    Ok(TermId::with_pool(default_prefix, id, pool))
}

/// Parses the lines of an IDS file
///
/// If `expect_header` is set, a leading [`IDS_HEADER`] line is skipped.
/// `lines_before` is the number of lines that were already consumed, it is
/// only used for log messages.
pub(super) fn parse<B: BufRead>(
    reader: B,
    expect_header: bool,
    lines_before: usize,
    ctx: &ParseContext<'_>,
) -> AssocResult<ParsedAnnotations> {
    let options = ctx.options;
    let mut pool = PrefixPool::new();
    let mut records: Vec<AnnotationRecord> = Vec::with_capacity(DEFAULT_NUM_RECORDS);
    let mut symbols = SymbolCollector::default();
    let mut stats = ParseStats::default();
    let mut header_pending = expect_header;

    for (offset, line) in reader.split(b'\n').enumerate() {
        let line = line.map_err(|err| ctx.read_failed(err))?;
        let line_number = lines_before + offset + 1;
        let line = line.strip_suffix(b"\r").unwrap_or(&line);

        if header_pending {
            header_pending = false;
            if trim(line) == IDS_HEADER.as_bytes() {
                stats.header_lines += 1;
                continue;
            }
            debug!("{} has no IDS header", ctx.source_name);
        }

        if trim(line).is_empty() || line.starts_with(b"#") {
            continue;
        }
        stats.good += 1;

        let Some(tab) = line.iter().position(|b| *b == b'\t') else {
            stats.bad += 1;
            debug!("Line {} in {} has no tab", line_number, ctx.source_name);
            continue;
        };
        let symbol = trim(&line[..tab]);
        if symbol.is_empty() {
            stats.bad += 1;
            debug!("Line {} in {} has no symbol", line_number, ctx.source_name);
            continue;
        }
        let symbol = ByteString::new(symbol);

        if !options.accepts_any_name(std::iter::once(symbol.as_bytes())) {
            stats.skipped += 1;
            stats.name_mismatch += 1;
            continue;
        }

        let mut kept_terms = 0usize;
        for token in line[tab + 1..].split(|b| *b == b',').map(trim) {
            if token.is_empty() {
                continue;
            }
            let term_id = match parse_term(token, &options.default_prefix, &mut pool) {
                Ok(term_id) => term_id,
                Err(err) => {
                    stats.unknown_terms += 1;
                    warn!(
                        "Invalid term in line {} of {}: {}",
                        line_number, ctx.source_name, err
                    );
                    continue;
                }
            };
            if let Some(terms) = ctx.terms {
                if !terms.contains(&term_id) {
                    stats.unknown_terms += 1;
                    warn!(
                        "Skipping unknown term {} of {} in line {}",
                        term_id, symbol, line_number
                    );
                    continue;
                }
            }
            records.push(AnnotationRecord::new(symbol.clone(), term_id).with_object_name(&symbol));
            kept_terms += 1;
        }

        if kept_terms > 0 {
            stats.kept += 1;
            symbols.add_symbol(&symbol);
        } else {
            stats.skipped += 1;
        }
    }

    let symbols = symbols.into_index()?;
    debug!(
        "Collected {} records of {} entities from {}",
        records.len(),
        symbols.len(),
        ctx.source_name
    );
    Ok(ParsedAnnotations {
        kind: FileKind::Ids,
        records,
        symbols,
        stats,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::{AnnotationParser, ParserOptions};
    use crate::TermCatalog;

    fn parse_ids(data: &str, options: ParserOptions) -> ParsedAnnotations {
        AnnotationParser::from_reader(data.as_bytes(), "genes.ids", options, None)
            .into_parsed()
            .unwrap()
    }

    #[test]
    fn terms_with_and_without_prefix() {
        let mut pool = PrefixPool::new();
        assert_eq!(
            parse_term(b"HP:0000028", "HP", &mut pool).unwrap(),
            TermId::new("HP", 28)
        );
        assert_eq!(
            parse_term(b"175", "HP", &mut pool).unwrap(),
            TermId::new("HP", 175)
        );
        assert_eq!(
            parse_term(b"118", "GO", &mut pool).unwrap(),
            TermId::new("GO", 118)
        );
        assert!(parse_term(b"abc", "HP", &mut pool).is_err());
        assert!(parse_term(b"12a", "HP", &mut pool).is_err());
        assert!(parse_term(b"HP:", "HP", &mut pool).is_err());
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn two_terms() {
        let data = format!("{IDS_HEADER}\ngeneA\tHP:0000028,HP:0000175\n");
        let parsed = parse_ids(&data, ParserOptions::default());
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.stats.header_lines, 1);
        assert_eq!(parsed.stats.good, 1);
        assert_eq!(parsed.stats.kept, 1);
        assert_eq!(parsed.records[0].object_name(), "geneA");

        let index = parsed.into_index();
        let gene = index.lookup("geneA").unwrap();
        assert_eq!(gene.len(), 2);
        assert!(gene.has_term(&TermId::new("HP", 175)));
    }

    #[test]
    fn malformed_lines() {
        let data = format!("{IDS_HEADER}\nno tab here\n\tHP:0000001\ngeneA\t\ngeneB\t1, 2 ,\n");
        let parsed = parse_ids(&data, ParserOptions::default());
        let stats = parsed.stats;
        assert_eq!(stats.good, 4);
        assert_eq!(stats.bad, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.kept, 1);
        assert_eq!(stats.kept + stats.skipped + stats.bad, stats.good);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.symbols.len(), 1);
    }

    #[test]
    fn name_filter() {
        let data = format!("{IDS_HEADER}\ngeneA\t1\ngeneB\t2\n");
        let parsed = parse_ids(&data, ParserOptions::default().with_names(["geneB"]));
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].object_id(), "geneB");
        assert_eq!(parsed.stats.name_mismatch, 1);
    }

    #[test]
    fn unknown_terms_are_skipped() {
        let catalog: TermCatalog = [TermId::new("HP", 28)].into_iter().collect();
        let data = format!("{IDS_HEADER}\ngeneA\tHP:0000028,HP:0000175,oops\ngeneB\tHP:0000175\n");
        let parsed = AnnotationParser::from_reader(
            data.as_bytes(),
            "genes.ids",
            ParserOptions::default(),
            Some(&catalog),
        )
        .into_parsed()
        .unwrap();

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.stats.unknown_terms, 3);
        assert_eq!(parsed.stats.kept, 1);
        assert_eq!(parsed.stats.skipped, 1);
        assert!(parsed.symbols.map_symbol("geneB").is_none());
    }

    #[test]
    fn missing_header() {
        let parsed = parse_ids("geneA\t1\n", ParserOptions::default());
        assert_eq!(parsed.kind, FileKind::Ids);
        assert_eq!(parsed.stats.header_lines, 0);
        assert_eq!(parsed.records.len(), 1);
    }
}
