use criterion::{Criterion, black_box, criterion_group, criterion_main};

use treeprob::{Grammar, parse_treebank};

const TREEBANK: &str = r"
(S (NP (DT the) (NN dog)) (VP (VBZ barks)))
(S (NP (DT the) (NN cat)) (VP (VBZ sleeps)))
(S (NP (DT a) (NN dog)) (VP (VBZ sees) (NP (DT a) (NN cat))))
(S (NP (DT the) (NX (JJ quick) (NN dog))) (VP (VP (VBZ sees) (NP (DT a) (NN cat))) (PP (IN in) (NP (DT the) (NN park)))))
";

fn best(g: &Grammar, input: &[&str]) -> f64 {
  g.best_parse(input).map(|(_, p)| p).unwrap_or(0.0)
}

fn criterion_benchmark(c: &mut Criterion) {
  let trees = parse_treebank(TREEBANK).unwrap();
  let grammar = Grammar::induce(&trees).unwrap();
  let short_input = "the dog barks".split(' ').collect::<Vec<_>>();
  let long_input = "the quick dog sees a cat in the park"
    .split(' ')
    .collect::<Vec<_>>();

  c.bench_function("induce", |b| {
    b.iter(|| Grammar::induce(black_box(&trees)).unwrap())
  });

  c.bench_function("parse short", |b| {
    b.iter(|| best(black_box(&grammar), black_box(&short_input)))
  });

  c.bench_function("parse long with attachment", |b| {
    b.iter(|| best(black_box(&grammar), black_box(&long_input)))
  });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
