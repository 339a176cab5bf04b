//! Degraded-path benchmarks
//!
//! The fallback path runs exactly when GitLab is unhealthy, so it has to stay
//! cheap. Run with: `cargo bench --bench fallback_bench -p ciforge-core`

use std::sync::Arc;

use ciforge_core::{DegradedAnalysisProvider, FallbackCoordinator, PipelineGenerator};
use ciforge_domain::{AnalysisView, ProjectType, Result as DomainResult};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

struct LengthGenerator;

impl PipelineGenerator for LengthGenerator {
    fn generate(&self, analysis: AnalysisView<'_>) -> DomainResult<String> {
        Ok(analysis.build_commands().join("\n"))
    }
}

fn bench_basic_analysis(c: &mut Criterion) {
    let provider = DegradedAnalysisProvider::new();
    let mut group = c.benchmark_group("degraded_basic_analysis");

    for project_type in [ProjectType::Node, ProjectType::DotNet, ProjectType::Generic] {
        group.bench_with_input(
            BenchmarkId::from_parameter(project_type),
            &project_type,
            |b, &project_type| b.iter(|| black_box(provider.basic_analysis(black_box(project_type)))),
        );
    }

    group.finish();
}

fn bench_fallback_pipeline(c: &mut Criterion) {
    let coordinator = FallbackCoordinator::new(Arc::new(LengthGenerator));

    c.bench_function("generate_fallback_pipeline", |b| {
        b.iter(|| black_box(coordinator.generate_fallback_pipeline(black_box(ProjectType::Python))))
    });
}

criterion_group!(fallback, bench_basic_analysis, bench_fallback_pipeline);
criterion_main!(fallback);
