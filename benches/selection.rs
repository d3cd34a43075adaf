//! Benchmarks for compliance scoring and vendor selection

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_decimal::Decimal;
use uuid::Uuid;

use rfp_manager::procurement::models::{
    CandidateProposal, JudgmentStatus, RequirementJudgment, RfpContext,
};
use rfp_manager::procurement::{compliance_score, ProposalRanges, RulesPolicy};

fn candidates(n: usize) -> Vec<CandidateProposal> {
    (0..n)
        .map(|i| CandidateProposal {
            proposal_id: Uuid::new_v4(),
            vendor_id: Uuid::from_u128(i as u128),
            vendor_name: format!("Vendor {}", i),
            total_price: Some(Decimal::new(40_000 + (i as i64 * 137) % 9_000, 0)),
            proposed_delivery_days: Some(10 + (i as u32 % 30)),
            compliance_score: ((i * 37) % 101) as f64,
            warranty_offered: "2 years".to_string(),
            proposed_terms: "Net 30".to_string(),
        })
        .collect()
}

fn benchmark_compliance_score(c: &mut Criterion) {
    let statuses = [JudgmentStatus::Yes, JudgmentStatus::Partial, JudgmentStatus::No];
    let judgments: Vec<RequirementJudgment> = (0..50)
        .map(|i| RequirementJudgment::new(format!("Requirement {}", i), statuses[i % 3], ""))
        .collect();

    c.bench_function("compliance_score_50", |b| {
        b.iter(|| compliance_score(black_box(&judgments)))
    });
}

fn benchmark_selection(c: &mut Criterion) {
    let policy = RulesPolicy::default();
    let rfp = RfpContext {
        title: "Office Laptops".to_string(),
        total_budget: Decimal::new(50_000, 0),
        delivery_days: 30,
        requirements: vec![],
    };

    let mut group = c.benchmark_group("rules_policy");
    for size in [3usize, 30, 300] {
        let input = candidates(size);
        group.bench_with_input(BenchmarkId::new("evaluate", size), &input, |b, input| {
            b.iter(|| policy.evaluate(black_box(&rfp), black_box(input)))
        });
        group.bench_with_input(BenchmarkId::new("ranges", size), &input, |b, input| {
            b.iter(|| ProposalRanges::from_candidates(black_box(input)))
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_compliance_score, benchmark_selection);
criterion_main!(benches);
