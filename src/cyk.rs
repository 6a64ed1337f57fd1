use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, trace};

use crate::error::Error;
use crate::grammar::Grammar;
use crate::tagger::guess_tags;

/// How a cell item was built; enough to rebuild its derivation.
#[derive(Debug, Clone, PartialEq)]
pub enum Backpointer {
  /// Lexical leaf over the span's single token.
  Word(String),
  /// Single-child rewrite within the same span.
  Unary(String),
  /// Two children meeting at the item's split point.
  Binary(String, String),
}

impl fmt::Display for Backpointer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Word(token) => write!(f, "'{}'", token),
      Self::Unary(child) => write!(f, "{}", child),
      Self::Binary(left, right) => write!(f, "{} {}", left, right),
    }
  }
}

/// Best-known derivation of one label over one span. `score` is a natural
/// log probability; updates replace an item only on a strictly greater
/// score, which also keeps backpointer chains acyclic.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartItem {
  pub score: f64,
  pub split: usize,
  pub back: Backpointer,
}

impl ChartItem {
  /// Linear-scale probability of this derivation.
  pub fn probability(&self) -> f64 {
    self.score.exp()
  }
}

impl fmt::Display for ChartItem {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.back {
      Backpointer::Binary(_, _) => {
        write!(f, "{} @ {} ({})", self.back, self.split, self.probability())
      }
      _ => write!(f, "{} ({})", self.back, self.probability()),
    }
  }
}

/// One chart cell: the best item per label. Ordered so scans (and therefore
/// ties between equal-probability candidates) are reproducible.
pub type Cell = BTreeMap<String, ChartItem>;

/// Triangular table of the best items per half-open token span.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
  len: usize,
  cells: Vec<Cell>,
}

impl Chart {
  pub fn new(len: usize) -> Self {
    Self {
      len,
      cells: vec![Cell::new(); (len + 1) * (len + 1)],
    }
  }

  /// Token count this chart was built over.
  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  fn index(&self, begin: usize, end: usize) -> usize {
    debug_assert!(begin <= end && end <= self.len);
    begin * (self.len + 1) + end
  }

  pub fn cell(&self, begin: usize, end: usize) -> &Cell {
    &self.cells[self.index(begin, end)]
  }

  fn cell_mut(&mut self, begin: usize, end: usize) -> &mut Cell {
    let idx = self.index(begin, end);
    &mut self.cells[idx]
  }

  /// Best item for `label` over `(begin, end)`, if any.
  pub fn get(&self, begin: usize, end: usize, label: &str) -> Option<&ChartItem> {
    self.cell(begin, end).get(label)
  }
}

impl fmt::Display for Chart {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for span in 1..=self.len {
      for begin in 0..=(self.len - span) {
        let end = begin + span;
        let cell = self.cell(begin, end);
        if cell.is_empty() {
          continue;
        }
        writeln!(f, "{}..{}:", begin, end)?;
        for (label, item) in cell.iter() {
          writeln!(f, "  {} -> {}", label, item)?;
        }
      }
    }
    Ok(())
  }
}

/// Inserts `item` for `label` if it beats the current best. Strictly
/// greater only: an equal-score candidate never displaces the earlier one,
/// so the lexicographically first of tied candidates wins.
fn update(cell: &mut Cell, label: &str, item: ChartItem) -> bool {
  match cell.get(label) {
    Some(cur) if item.score <= cur.score => false,
    _ => {
      cell.insert(label.to_string(), item);
      true
    }
  }
}

/// Passes stop improving after at most one productive update per item per
/// pass; anything past this cap is floating-point pathology, not progress.
fn closure_pass_cap(grammar: &Grammar) -> usize {
  let n = grammar.nonterminals.len();
  n.saturating_mul(n) + 16
}

/// Fixpoint propagation of unary rules within one cell: while some label B
/// in the cell has parents A with A -> B, offer each A the score of B plus
/// the rule's log probability. Scores are bounded above by 0 and updates
/// are strictly increasing, so this terminates; the cap turns a
/// nonterminating scan into a reported invariant violation.
fn unary_closure(grammar: &Grammar, cell: &mut Cell, end: usize, cap: usize) -> Result<(), Error> {
  for pass in 0.. {
    if pass >= cap {
      return Err(Error::ClosureDiverged(cap));
    }
    let snapshot: Vec<(String, f64)> = cell
      .iter()
      .map(|(label, item)| (label.clone(), item.score))
      .collect();
    let mut progressed = false;
    for (child, child_score) in snapshot {
      if let Some(parents) = grammar.parents_of_single(&child) {
        for (parent, prob) in parents {
          let candidate = ChartItem {
            score: child_score + prob.ln(),
            split: end,
            back: Backpointer::Unary(child.clone()),
          };
          progressed |= update(cell, parent, candidate);
        }
      }
    }
    if !progressed {
      break;
    }
    trace!(pass, end, "unary closure progressed");
  }
  Ok(())
}

/// Seeds the length-1 cell for `token`. A token seen in training takes its
/// lexical parents from the reverse index; an unseen one gets each guessed
/// tag the grammar knows as a part of speech, at that tag's fallback
/// probability.
fn seed_token(grammar: &Grammar, cell: &mut Cell, token: &str, end: usize) -> Result<(), Error> {
  if grammar.knows_token(token) {
    if let Some(parents) = grammar.parents_of_single(token) {
      for (parent, prob) in parents {
        let item = ChartItem {
          score: prob.ln(),
          split: end,
          back: Backpointer::Word(token.to_string()),
        };
        update(cell, parent, item);
      }
    }
  } else {
    for tag in guess_tags(token)? {
      if let Some(floor) = grammar.unknown_fallback.get(*tag) {
        let item = ChartItem {
          score: floor.ln(),
          split: end,
          back: Backpointer::Word(token.to_string()),
        };
        update(cell, tag, item);
      }
    }
  }
  Ok(())
}

/// Fills a CYK chart for `tokens` under `grammar`, longest spans last so
/// every sub-span a cell consults is already final. Every split point of
/// every span is considered; a cell that ends up empty simply offers no
/// candidates to larger spans.
pub fn parse_chart(grammar: &Grammar, tokens: &[&str]) -> Result<Chart, Error> {
  let n = tokens.len();
  let cap = closure_pass_cap(grammar);
  let mut chart = Chart::new(n);
  debug!(tokens = n, "filling chart");

  for (i, token) in tokens.iter().enumerate() {
    let mut cell = Cell::new();
    seed_token(grammar, &mut cell, token, i + 1)?;
    unary_closure(grammar, &mut cell, i + 1, cap)?;
    *chart.cell_mut(i, i + 1) = cell;
  }

  for span in 2..=n {
    for begin in 0..=(n - span) {
      let end = begin + span;
      let mut cell = Cell::new();
      for split in begin + 1..end {
        let left = chart.cell(begin, split);
        let right = chart.cell(split, end);
        for (b, b_item) in left.iter() {
          for (c, c_item) in right.iter() {
            if let Some(parents) = grammar.parents_of_pair(b, c) {
              for (parent, prob) in parents {
                let item = ChartItem {
                  score: b_item.score + c_item.score + prob.ln(),
                  split,
                  back: Backpointer::Binary(b.clone(), c.clone()),
                };
                update(&mut cell, parent, item);
              }
            }
          }
        }
      }
      unary_closure(grammar, &mut cell, end, cap)?;
      *chart.cell_mut(begin, end) = cell;
    }
  }

  Ok(chart)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grammar::SUM_TOLERANCE;
  use crate::parse_tree::parse_treebank;

  fn minimal() -> Grammar {
    let trees = parse_treebank("(S (NP John) (VP sleeps))").unwrap();
    Grammar::induce(&trees).unwrap()
  }

  #[test]
  fn test_minimal_grammar_parses_at_probability_one() {
    let g = minimal();
    let chart = parse_chart(&g, &["John", "sleeps"]).unwrap();
    let item = chart.get(0, 2, "S").unwrap();
    assert!((item.probability() - 1.0).abs() < SUM_TOLERANCE);
    assert_eq!(item.split, 1);
    assert_eq!(
      item.back,
      Backpointer::Binary("NP".to_string(), "VP".to_string())
    );
  }

  #[test]
  fn test_lexical_seeding_keeps_best_per_label() {
    let g = minimal();
    let chart = parse_chart(&g, &["John", "sleeps"]).unwrap();
    let np = chart.get(0, 1, "NP").unwrap();
    assert!((np.probability() - 1.0).abs() < SUM_TOLERANCE);
    assert_eq!(np.back, Backpointer::Word("John".to_string()));
    assert!(chart.get(1, 2, "NP").is_none());
  }

  #[test]
  fn test_unary_closure_fixpoint_and_idempotence() {
    // S -> VP -> VB -> run, all unary, so closure must chain upward.
    let trees = parse_treebank("(S (VP (VB run)))").unwrap();
    let g = Grammar::induce(&trees).unwrap();
    let cap = closure_pass_cap(&g);

    let mut cell = Cell::new();
    seed_token(&g, &mut cell, "run", 1).unwrap();
    unary_closure(&g, &mut cell, 1, cap).unwrap();

    for label in ["VB", "VP", "S"] {
      let item = cell.get(label).unwrap();
      assert!((item.probability() - 1.0).abs() < SUM_TOLERANCE, "{}", label);
    }
    assert_eq!(cell["S"].back, Backpointer::Unary("VP".to_string()));

    // A second application changes nothing.
    let once = cell.clone();
    unary_closure(&g, &mut cell, 1, cap).unwrap();
    assert_eq!(cell, once);
  }

  #[test]
  fn test_unseen_token_seeds_known_tags_at_fallback() {
    let trees = parse_treebank(
      r"
        (S (NP (NNP John)) (VP (VBZ sleeps)))
        (S (NP (NNP Bill)) (VP (VBZ runs)))
      ",
    )
    .unwrap();
    let g = Grammar::induce(&trees).unwrap();

    let chart = parse_chart(&g, &["Tom", "sleeps"]).unwrap();
    // "Tom" guesses NNP and NNPS; only NNP is a known part of speech.
    let nnp = chart.get(0, 1, "NNP").unwrap();
    assert!((nnp.probability() - 0.5).abs() < SUM_TOLERANCE);
    assert_eq!(nnp.back, Backpointer::Word("Tom".to_string()));
    assert!(chart.get(0, 1, "NNPS").is_none());

    let s = chart.get(0, 2, "S").unwrap();
    assert!((s.probability() - 0.25).abs() < SUM_TOLERANCE);
  }

  #[test]
  fn test_incompatible_tokens_leave_cell_empty() {
    let g = minimal();
    // Reversed order has no S -> VP NP rule; the full span stays empty.
    let chart = parse_chart(&g, &["sleeps", "John"]).unwrap();
    assert!(chart.cell(0, 2).is_empty());
  }

  #[test]
  fn test_equal_scores_keep_earliest_split() {
    // E -> E E | x; over "x x x" both bracketings tie, so the first split
    // considered must win and stay.
    let trees = parse_treebank(
      r"
        (E (E (E x) (E x)) (E x))
        (E (E x) (E (E x) (E x)))
      ",
    )
    .unwrap();
    let g = Grammar::induce(&trees).unwrap();
    let chart = parse_chart(&g, &["x", "x", "x"]).unwrap();
    let item = chart.get(0, 3, "E").unwrap();
    assert_eq!(item.split, 1);
  }

  #[test]
  fn test_empty_input_yields_empty_chart() {
    let g = minimal();
    let chart = parse_chart(&g, &[]).unwrap();
    assert!(chart.is_empty());
    assert!(chart.cell(0, 0).is_empty());
  }
}
