use crate::cyk::{Backpointer, Chart};
use crate::error::Error;
use crate::grammar::Grammar;
use crate::syntree::SynTree;

/// Reconstructs the maximum-probability derivation of the grammar's start
/// symbol over `(begin, end)` from a filled chart. Ties were already broken
/// while filling: cells scan candidates in lexicographic label order and
/// only a strictly greater score replaces an item, so the extracted tree is
/// the same on every run.
pub fn extract(
  chart: &Chart,
  grammar: &Grammar,
  begin: usize,
  end: usize,
) -> Result<SynTree, Error> {
  if chart.get(begin, end, &grammar.start).is_none() {
    return Err(Error::NoParseFound { begin, end });
  }
  Ok(extract_label(chart, &grammar.start, begin, end))
}

/// Log probability of the best derivation `extract` would return.
pub fn best_score(
  chart: &Chart,
  grammar: &Grammar,
  begin: usize,
  end: usize,
) -> Result<f64, Error> {
  chart
    .get(begin, end, &grammar.start)
    .map(|item| item.score)
    .ok_or(Error::NoParseFound { begin, end })
}

fn extract_label(chart: &Chart, label: &str, begin: usize, end: usize) -> SynTree {
  let item = chart
    .get(begin, end, label)
    .expect("backpointer into an empty cell");
  match &item.back {
    Backpointer::Word(token) => SynTree::Leaf(label.to_string(), token.clone()),
    Backpointer::Unary(child) => SynTree::Branch(
      label.to_string(),
      vec![extract_label(chart, child, begin, end)],
    ),
    Backpointer::Binary(left, right) => SynTree::Branch(
      label.to_string(),
      vec![
        extract_label(chart, left, begin, item.split),
        extract_label(chart, right, item.split, end),
      ],
    ),
  }
}
