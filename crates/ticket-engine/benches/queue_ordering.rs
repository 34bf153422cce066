//! Benchmarks for the queue ordering hot path

use chrono::{Duration, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use queuehub_ticket_engine::queue::{next_in_line, sort_cohort};
use queuehub_ticket_engine::queue::position::compute_position;
use queuehub_ticket_engine::types::{Ticket, TicketStatus};

fn make_cohort(size: usize) -> Vec<Ticket> {
    let base = Utc::now();
    (0..size)
        .map(|i| Ticket {
            id: format!("ticket-{:06}", i),
            number: format!("A-{:03}", i + 1),
            branch_id: "branch-1".to_string(),
            service_id: "service-1".to_string(),
            staff_id: None,
            status: TicketStatus::Waiting,
            // A few priority levels, interleaved
            priority: (i % 4) as i32 + 1,
            created_at: base + Duration::milliseconds(i as i64),
            called_at: None,
            served_at: None,
            completed_at: None,
            estimated_wait_time: 0,
            notes: String::new(),
        })
        .collect()
}

fn bench_ordering(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_ordering");

    for size in [10usize, 100, 1000] {
        let cohort = make_cohort(size);

        group.bench_with_input(BenchmarkId::new("next_in_line", size), &cohort, |b, cohort| {
            b.iter(|| next_in_line(cohort));
        });

        group.bench_with_input(BenchmarkId::new("sort_cohort", size), &cohort, |b, cohort| {
            b.iter_batched(
                || cohort.clone(),
                |mut cohort| sort_cohort(&mut cohort),
                criterion::BatchSize::SmallInput,
            );
        });

        let target = cohort[size / 2].id.clone();
        group.bench_with_input(
            BenchmarkId::new("compute_position", size),
            &cohort,
            |b, cohort| {
                b.iter(|| compute_position(cohort, &target, 15));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_ordering);
criterion_main!(benches);
