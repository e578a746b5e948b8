use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ideascout_core::normalize::normalize_abstract;
use ideascout_core::research::curate::{Curator, canonical_title, deduplicate};
use ideascout_core::research::terms::{heuristic_terms, parse_ai_terms};
use ideascout_core::{NormalizedPaper, PaperSource};

fn sample_papers(n: usize) -> Vec<NormalizedPaper> {
    (0..n)
        .map(|i| NormalizedPaper {
            title: format!(
                "Computer vision for crop disease detection, study {}",
                i % (n / 3).max(1)
            ),
            authors: vec!["Jane Doe".to_string(), "Ravi Kumar".to_string()],
            abstract_text: "We apply convolutional neural networks to leaf images collected \
                            from smallholder farms and evaluate precision farming outcomes."
                .to_string(),
            published_date: format!("{}-06-01", 2005 + i % 20),
            source: PaperSource::ALL[i % 3],
            url: format!("https://example.org/paper/{i}"),
            doi: (i % 2 == 0).then(|| format!("10.1000/{i}")),
        })
        .collect()
}

fn bench_terms(c: &mut Criterion) {
    c.bench_function("heuristic_terms_short_idea", |b| {
        b.iter(|| heuristic_terms(black_box("AI-powered crop monitoring")))
    });

    c.bench_function("heuristic_terms_long_idea", |b| {
        b.iter(|| {
            heuristic_terms(black_box(
                "A mobile app using computer vision to detect crop diseases from phone photos \
                 and recommend treatments to smallholder farmers in low-connectivity regions",
            ))
        })
    });

    c.bench_function("parse_ai_terms", |b| {
        b.iter(|| {
            parse_ai_terms(black_box(
                "1. plant disease detection\n2. convolutional neural networks\n3. precision agriculture",
            ))
        })
    });
}

fn bench_curation(c: &mut Criterion) {
    let terms = vec![
        "computer vision".to_string(),
        "crop disease".to_string(),
        "precision farming".to_string(),
    ];
    let curator = Curator::new(&terms, 2025);
    let small = sample_papers(30);
    let large = sample_papers(300);

    c.bench_function("canonical_title", |b| {
        b.iter(|| canonical_title(black_box("Deep Learning: for  Crop-Disease Detection!")))
    });

    c.bench_function("deduplicate_300", |b| {
        b.iter(|| deduplicate(black_box(large.clone())))
    });

    c.bench_function("curate_30", |b| {
        b.iter(|| curator.curate(black_box(small.clone()), 10))
    });

    c.bench_function("curate_300", |b| {
        b.iter(|| curator.curate(black_box(large.clone()), 20))
    });

    let long_abstract = "word ".repeat(400);
    c.bench_function("normalize_abstract_long", |b| {
        b.iter(|| normalize_abstract(black_box(Some(&long_abstract))))
    });
}

criterion_group!(benches, bench_terms, bench_curation);
criterion_main!(benches);
