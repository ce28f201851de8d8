use checkout_saga::{Saga, SagaContext, SagaError, StepControl, StepPolicy};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use tokio::runtime::Runtime;

#[derive(Clone, Debug, Default)]
struct BenchContext {
  counter: u64,
}

fn build_saga(num_steps: usize, failing_best_effort: bool) -> Saga<BenchContext, SagaError> {
  let names: Vec<&'static str> = (0..num_steps)
    .map(|i| &*Box::leak(format!("step_{}", i).into_boxed_str()))
    .collect();
  let defs: Vec<_> = names
    .iter()
    .enumerate()
    .map(|(i, name)| {
      let policy = if i % 2 == 0 { StepPolicy::Required } else { StepPolicy::BestEffort };
      (*name, policy, None)
    })
    .collect();

  let mut saga = Saga::<BenchContext, SagaError>::new(&defs);
  for (i, name) in names.iter().enumerate() {
    let fail = failing_best_effort && i % 2 == 1;
    saga.on_step(name, move |ctx: SagaContext<BenchContext>| {
      Box::pin(async move {
        if fail {
          return Err(SagaError::from(anyhow::anyhow!("best-effort failure")));
        }
        ctx.write().counter += 1;
        Ok(StepControl::Continue)
      })
    });
  }
  saga
}

fn bench_saga_run(c: &mut Criterion) {
  let mut group = c.benchmark_group("SagaRun");
  let rt = Runtime::new().unwrap();

  for num_steps in [1usize, 6, 12] {
    for failing in [false, true] {
      let saga = build_saga(num_steps, failing);
      let id = BenchmarkId::new(if failing { "degraded" } else { "clean" }, num_steps);
      group.bench_with_input(id, &num_steps, |b, _| {
        b.to_async(&rt).iter(|| async {
          let ctx = SagaContext::with_correlation_id(BenchContext::default(), "bench");
          saga.run(ctx).await.unwrap()
        })
      });
    }
  }
  group.finish();
}

criterion_group!(benches, bench_saga_run);
criterion_main!(benches);
