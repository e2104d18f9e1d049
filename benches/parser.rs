use std::fmt::Write;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rayon::prelude::*;

use hpo_assoc::{AnnotationParser, ParserOptions};

/// Builds a GAF-like file with `diseases` diseases and 20 annotations each
fn synthetic_gaf(diseases: u32) -> String {
    let mut data = String::from("#disease-db\tdisease-identifier\tdisease-name\n");
    for disease in 0..diseases {
        let id = 100_000 + disease;
        for term in 0..20 {
            let qualifier = if term % 7 == 0 { "NOT" } else { "" };
            let evidence = if term % 3 == 0 { "IEA" } else { "TAS" };
            writeln!(
                data,
                "OMIM\t{id}\tDISEASE {id}\t{qualifier}\tHP:{:07}\tOMIM:{id}\t{evidence}\t\t\t\tO\tSYN{id}|ALT{id}\t2009.07.24\tHPO:skoehler",
                1 + (disease * 31 + term * 17) % 15_000
            )
            .expect("writing to a String never fails");
        }
    }
    data
}

fn parse(data: &[u8], options: ParserOptions) -> usize {
    AnnotationParser::from_reader(data, "bench.tab", options, None)
        .into_parsed()
        .expect("in-memory data can be parsed")
        .records
        .len()
}

fn parser_benchmark(c: &mut Criterion) {
    let data = synthetic_gaf(5_000);
    let bytes = data.as_bytes();

    c.bench_function("parse gaf", |b| {
        b.iter(|| parse(black_box(bytes), ParserOptions::default()))
    });

    c.bench_function("parse gaf with evidence filter", |b| {
        b.iter(|| {
            parse(
                black_box(bytes),
                ParserOptions::default().with_evidence_codes(["IEA"]),
            )
        })
    });

    let parsed = AnnotationParser::from_reader(bytes, "bench.tab", ParserOptions::default(), None)
        .into_parsed()
        .expect("in-memory data can be parsed");

    c.bench_function("build index", |b| b.iter(|| black_box(&parsed).index().len()));

    let index = parsed.index();
    let keys: Vec<String> = (0..5_000u32)
        .map(|disease| format!("SYN{}", 100_000 + disease))
        .collect();

    c.bench_function("lookup synonyms", |b| {
        b.iter(|| {
            keys.iter()
                .filter_map(|key| index.lookup(black_box(key)))
                .count()
        })
    });

    c.bench_function("lookup synonyms parallel", |b| {
        b.iter(|| {
            keys.par_iter()
                .filter_map(|key| index.lookup(black_box(key)))
                .count()
        })
    });
}

criterion_group! {
    name = parser;
    config = Criterion::default().sample_size(20).measurement_time(Duration::from_secs(10));
    targets = parser_benchmark
}
criterion_main!(parser);
