use criterion::{black_box, criterion_group, criterion_main, Criterion};

use critica_core::answer::AnswerAnalyzer;
use critica_core::model::{AnswerAnalysisRequest, Question, QuestionType};
use critica_core::patterns::analyze_local_patterns;

const SHORT: &str = "Todos los estudiantes siempre entienden todo sin esfuerzo.";

fn long_document() -> String {
    "Obviamente la reforma es terrible y horrible. Si la aprobamos, entonces \
     todo llevará a la ruina. Solo importa el precio y nadie lo discute. "
        .repeat(40)
}

fn bench_patterns(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern_library");
    let long = long_document();

    group.bench_function("short_sentence", |b| {
        b.iter(|| analyze_local_patterns(black_box(SHORT)))
    });

    group.bench_function("long_document", |b| {
        b.iter(|| analyze_local_patterns(black_box(&long)))
    });

    group.finish();
}

fn bench_answer(c: &mut Criterion) {
    let analyzer = AnswerAnalyzer::default();
    let request = AnswerAnalysisRequest::new(
        "El autor sugiere que la sequía provoca migración porque faltan cultivos, \
         aunque no presenta datos.",
    )
    .with_question(Question {
        prompt: "Explica la relación entre sequía y migración.".into(),
        question_type: QuestionType::Inferential,
        hint: None,
    })
    .with_source("La Sequía del Sahel afectó a Níger, Chad y Malí durante la década.");

    c.bench_function("answer_analyzer", |b| {
        b.iter(|| analyzer.analyze(black_box(&request)))
    });
}

criterion_group!(benches, bench_patterns, bench_answer);
criterion_main!(benches);
