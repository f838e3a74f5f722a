use criterion::{black_box, criterion_group, criterion_main, Criterion};

use examscore_core::model::ParticipantSummary;
use examscore_core::ranking::RankingEngine;

fn make_summaries(n: usize) -> Vec<ParticipantSummary> {
    (0..n)
        .map(|i| {
            let correct = (i * 7 % 60) as u32;
            let incorrect = (i * 3 % 20) as u32;
            ParticipantSummary {
                participant_id: format!("p{i}"),
                obtained_marks: f64::from(correct) * 4.0 - f64::from(incorrect),
                max_possible_marks: 360.0,
                correct_count: correct,
                incorrect_count: incorrect,
                unattempted_count: 90 - correct - incorrect,
                total_questions: 90,
                accuracy: if correct + incorrect == 0 {
                    0.0
                } else {
                    f64::from(correct) / f64::from(correct + incorrect)
                },
                time_spent_minutes: (i % 180) as f64,
            }
        })
        .collect()
}

fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");
    let engine = RankingEngine::new();

    for n in [100, 10_000] {
        let summaries = make_summaries(n);
        group.bench_function(format!("participants={n}"), |b| {
            b.iter(|| engine.rank("bench", black_box(summaries.clone())))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rank);
criterion_main!(benches);
