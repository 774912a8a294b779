use aissembly::{
    parse_program, parse_source, unparse_program, Environment, Evaluator, MockOracle,
    OracleRegistry, ParserOptions,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn generated_program(statements: usize) -> String {
    let mut source = String::new();
    for n in 0..statements {
        source.push_str(&format!(
            "let v{n} = for (range(0, {limit}), init=[]):\n    -> if(i % 3 == 0) ? append(acc, i * {n}) : acc\n",
            n = n,
            limit = 20 + n % 7
        ));
        source.push_str(&format!(
            "let s{n} = cond(test=len(v{n}) > 5):\n    then:\n        -> {{\"count\": len(v{n}), \"head\": v{n}[:2]}}\n    else:\n        -> \"short\"\n",
            n = n
        ));
    }
    source
}

fn bench_parse(c: &mut Criterion) {
    let source = generated_program(50);
    c.bench_function("parse 100 statements", |b| {
        b.iter(|| parse_source(black_box(&source)))
    });
    c.bench_function("parse 100 statements line by line", |b| {
        b.iter(|| parse_program(black_box(&source), &ParserOptions::default()))
    });
}

fn bench_unparse(c: &mut Criterion) {
    let program = parse_source(&generated_program(50)).unwrap();
    c.bench_function("unparse 100 statements", |b| {
        b.iter(|| unparse_program(black_box(&program)))
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let program = parse_source(&generated_program(50)).unwrap();
    let registry = OracleRegistry::new();
    let oracle = MockOracle::new();
    c.bench_function("evaluate 100 statements", |b| {
        b.iter(|| {
            let mut env = Environment::new();
            Evaluator::new(&registry, &oracle)
                .eval_program(black_box(&program), &mut env)
                .unwrap();
            env
        })
    });
}

criterion_group!(benches, bench_parse, bench_unparse, bench_evaluate);
criterion_main!(benches);
