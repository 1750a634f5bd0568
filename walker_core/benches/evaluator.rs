use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use std::time::Duration;
use walker_core::mocks::NullLink;
use walker_core::{Expr, Function, MotorDistributor, MotorFunctions};

fn configure(g: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>) {
    // Quick runs without CLI flags:
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p walker_core --bench evaluator
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(Duration::from_millis(ms_u64));
    }
}

pub fn bench_expr(c: &mut Criterion) {
    let mut g = c.benchmark_group("expr");
    configure(&mut g);

    for src in ["96 + 20*sin(t/500*pi)", "t // 7 % 3 + hypot(t, 2) ** 0.5"] {
        let expr = Expr::compile(src).unwrap_or_else(|e| panic!("{src}: {e}"));
        g.bench_function(format!("eval {src}"), |b| {
            let mut t = 0.0;
            b.iter(|| {
                t += 1.0;
                black_box(expr.eval(black_box(t)))
            });
        });
    }
    g.bench_function("compile", |b| {
        b.iter(|| Expr::compile(black_box("36 + 121 * (1 + cos(t / 1000)) / 2")))
    });

    let mut fcs = MotorFunctions::new();
    for i in 0..8 {
        let lo = i * 250;
        fcs.push(Function::parse("90 + t / 100", lo, lo + 249).unwrap_or_else(|e| panic!("{e}")));
    }
    g.bench_function("select_last_of_8", |b| {
        b.iter_batched(
            || 0_i64,
            |mut anchor| black_box(fcs.next_pos(&mut anchor, 1_900, false)),
            BatchSize::SmallInput,
        )
    });
    g.finish();
}

pub fn bench_frames(c: &mut Criterion) {
    let mut g = c.benchmark_group("frames");
    configure(&mut g);
    let mut d = MotorDistributor::with_guard(NullLink, Duration::ZERO);
    g.bench_function("step_of_12", |b| {
        b.iter(|| {
            for i in 0..12_i64 {
                let _ = d.command(i / 4 + 1, i % 4, 0, black_box(36 + i * 10));
            }
        });
    });
    g.finish();
}

criterion_group!(evaluator, bench_expr, bench_frames);
criterion_main!(evaluator);
