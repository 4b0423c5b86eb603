use criterion::{Criterion, black_box, criterion_group, criterion_main};
use indoc::indoc;

use budlang::interp::{Interp, InterpConfig};
use budlang::parser;

const WORKLOAD: &str = indoc! {"
    def fib(n) {
        if (n < 2) {
            return n
        }
        return fib(n - 1) + fib(n - 2)
    }

    let totals = [0]
    for (i = 0; i < 200; i += 1) {
        totals[0] += i * i % 7
    }
    let squares = [x * x for x in [1, 2, 3, 4, 5, 6, 7, 8] if x % 2 == 0]
    print(totals[0])
    print(squares)
    print(fib(15))
"};

fn bench_interpreter(c: &mut Criterion) {
    let program = parser::parse(WORKLOAD).expect("parse workload");

    c.bench_function("parse_workload", |b| {
        b.iter(|| {
            let out = parser::parse(black_box(WORKLOAD)).expect("parse workload");
            black_box(out);
        })
    });

    c.bench_function("eval_workload", |b| {
        b.iter(|| {
            let mut interp = Interp::new(InterpConfig::default());
            interp.run(black_box(&program)).expect("run workload");
            black_box(interp.take_output());
        })
    });
}

criterion_group!(benches, bench_interpreter);
criterion_main!(benches);
