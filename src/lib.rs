#[macro_use]
extern crate lazy_static;

pub mod cyk;
pub mod error;
pub mod grammar;
pub mod parse_tree;
pub mod persist;
pub mod syntree;
pub mod tagger;
pub mod viterbi;

pub use crate::cyk::{Backpointer, Chart, ChartItem, parse_chart};
pub use crate::error::Error;
pub use crate::grammar::Grammar;
pub use crate::parse_tree::parse_treebank;
pub use crate::persist::SerializedGrammar;
pub use crate::syntree::SynTree;
pub use crate::tagger::guess_tags;
pub use crate::viterbi::{best_score, extract};

impl Grammar {
  pub fn parse_chart(&self, input: &[&str]) -> Result<Chart, Error> {
    parse_chart(self, input)
  }

  /// Parses `input` and extracts the single best derivation together with
  /// its linear-scale probability.
  pub fn best_parse(&self, input: &[&str]) -> Result<(SynTree, f64), Error> {
    let chart = self.parse_chart(input)?;
    let tree = extract(&chart, self, 0, input.len())?;
    let score = best_score(&chart, self, 0, input.len())?;
    Ok((tree, score.exp()))
  }
}

#[test]
fn test_treebank_to_best_parse() {
  let trees = parse_treebank(
    r"
      (S (NP (DT the) (NN dog)) (VP (VBZ barks)))
      (S (NP (DT the) (NN cat)) (VP (VBZ sleeps)))
      (S (NP (DT a) (NN dog)) (VP (VBZ sees) (NP (DT a) (NN cat))))
    ",
  )
  .unwrap();
  let g = Grammar::induce(&trees).unwrap();

  let (tree, prob) = g
    .best_parse(&["the", "dog", "sees", "a", "cat"])
    .unwrap();
  assert_eq!(
    tree.to_string(),
    "(S (NP (DT the) (NN dog)) (VP (VBZ sees) (NP (DT a) (NN cat))))"
  );
  assert!(prob > 0.0 && prob <= 1.0);

  // An out-of-vocabulary noun still parses through its guessed tag.
  let (tree, _) = g.best_parse(&["a", "stallion", "barks"]).unwrap();
  assert_eq!(tree.tokens(), vec!["a", "stallion", "barks"]);

  assert!(matches!(
    g.best_parse(&["barks", "barks", "barks"]),
    Err(Error::NoParseFound { .. })
  ));
}
