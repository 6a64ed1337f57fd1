use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::debug;

use crate::error::Error;
use crate::syntree::SynTree;

/// Child-label sequence on the right-hand side of a rule. Length 1 is a
/// lexical or unary rewrite, length >= 2 a branching one.
pub type Rhs = Vec<String>;

/// Tolerance for per-parent probability sums.
pub const SUM_TOLERANCE: f64 = 1e-9;

/// A probabilistic context-free grammar induced from a treebank. Built once
/// and read-only afterwards; safe to share across parses.
#[derive(Debug, Clone, PartialEq)]
pub struct Grammar {
  pub start: String,
  /// Tokens observed in training.
  pub terminals: BTreeSet<String>,
  /// Labels that appeared as a rule parent.
  pub nonterminals: BTreeSet<String>,
  /// Parents all of whose recorded rules are lexical (single-token).
  pub part_of_speech: BTreeSet<String>,
  /// parent -> child sequence -> probability; sums to 1 per parent.
  pub rules: BTreeMap<String, BTreeMap<Rhs, f64>>,
  /// Raw per-parent occurrence totals from induction.
  pub rule_totals: BTreeMap<String, u64>,
  /// Smoothing probability used when a tag is guessed for an unseen token:
  /// the minimum probability among that tag's own rules.
  pub unknown_fallback: BTreeMap<String, f64>,
  /// Transpose of `rules`: child sequence -> parent -> probability. This is
  /// the index the parser queries.
  pub reverse_rules: BTreeMap<Rhs, BTreeMap<String, f64>>,
}

impl Grammar {
  /// Induces a grammar by counting rule occurrences over a treebank and
  /// normalizing per parent. The start symbol is the first tree's root.
  pub fn induce(trees: &[SynTree]) -> Result<Self, Error> {
    let start = trees
      .first()
      .map(|t| t.label().to_string())
      .ok_or_else(|| {
        Error::GrammarInconsistency("cannot induce from an empty corpus".to_string())
      })?;

    let mut counts: BTreeMap<String, BTreeMap<Rhs, u64>> = BTreeMap::new();
    let mut totals: BTreeMap<String, u64> = BTreeMap::new();
    let mut terminals: BTreeSet<String> = BTreeSet::new();
    let mut nonterminals: BTreeSet<String> = BTreeSet::new();
    let mut pos_candidates: BTreeSet<String> = BTreeSet::new();
    let mut nonlexical: BTreeSet<String> = BTreeSet::new();

    // Counts don't depend on visit order, so a plain worklist is enough and
    // keeps deep trees off the call stack.
    let mut queue: Vec<&SynTree> = trees.iter().collect();
    while let Some(node) = queue.pop() {
      let (label, rhs) = match node {
        SynTree::Leaf(label, token) => {
          terminals.insert(token.clone());
          pos_candidates.insert(label.clone());
          (label, vec![token.clone()])
        }
        SynTree::Branch(label, children) => {
          nonlexical.insert(label.clone());
          queue.extend(children.iter());
          (label, children.iter().map(|c| c.label().to_string()).collect())
        }
      };
      nonterminals.insert(label.clone());
      *counts
        .entry(label.clone())
        .or_default()
        .entry(rhs)
        .or_insert(0) += 1;
      *totals.entry(label.clone()).or_insert(0) += 1;
    }

    let mut rules: BTreeMap<String, BTreeMap<Rhs, f64>> = BTreeMap::new();
    let mut reverse_rules: BTreeMap<Rhs, BTreeMap<String, f64>> = BTreeMap::new();
    for (parent, rhs_counts) in counts {
      let total = totals.get(&parent).copied().unwrap_or(0);
      if total == 0 {
        return Err(Error::GrammarInconsistency(format!(
          "zero total count for {}",
          parent
        )));
      }
      let mut normalized = BTreeMap::new();
      for (rhs, count) in rhs_counts {
        let prob = count as f64 / total as f64;
        reverse_rules
          .entry(rhs.clone())
          .or_default()
          .insert(parent.clone(), prob);
        normalized.insert(rhs, prob);
      }
      rules.insert(parent, normalized);
    }

    // A tag is only a true part of speech if every rule it heads is lexical.
    let part_of_speech: BTreeSet<String> = pos_candidates
      .into_iter()
      .filter(|label| !nonlexical.contains(label))
      .collect();

    let unknown_fallback: BTreeMap<String, f64> = part_of_speech
      .iter()
      .map(|pos| {
        let floor = rules[pos]
          .values()
          .copied()
          .fold(f64::INFINITY, f64::min);
        (pos.clone(), floor)
      })
      .collect();

    debug!(
      trees = trees.len(),
      nonterminals = nonterminals.len(),
      terminals = terminals.len(),
      pos = part_of_speech.len(),
      start = %start,
      "induced grammar"
    );

    let grammar = Self {
      start,
      terminals,
      nonterminals,
      part_of_speech,
      rules,
      rule_totals: totals,
      unknown_fallback,
      reverse_rules,
    };
    grammar.validate()?;
    Ok(grammar)
  }

  /// Consistency check: positive totals, per-parent sums of 1, and
  /// `reverse_rules` an exact transpose of `rules`.
  pub fn validate(&self) -> Result<(), Error> {
    let mut forward_entries = 0usize;
    for (parent, rhs_probs) in &self.rules {
      if self.rule_totals.get(parent).copied().unwrap_or(0) == 0 {
        return Err(Error::GrammarInconsistency(format!(
          "zero total count for {}",
          parent
        )));
      }
      let sum: f64 = rhs_probs.values().sum();
      if (sum - 1.0).abs() > SUM_TOLERANCE {
        return Err(Error::GrammarInconsistency(format!(
          "rules for {} sum to {}",
          parent, sum
        )));
      }
      forward_entries += rhs_probs.len();
      for (rhs, prob) in rhs_probs {
        match self.reverse_rules.get(rhs).and_then(|ps| ps.get(parent)) {
          Some(rev) if rev == prob => {}
          _ => {
            return Err(Error::GrammarInconsistency(format!(
              "reverse index out of sync for {} -> {:?}",
              parent, rhs
            )));
          }
        }
      }
    }
    let reverse_entries: usize = self.reverse_rules.values().map(|ps| ps.len()).sum();
    if forward_entries != reverse_entries {
      return Err(Error::GrammarInconsistency(format!(
        "{} forward rules but {} reverse entries",
        forward_entries, reverse_entries
      )));
    }
    Ok(())
  }

  /// Parents that can rewrite to the single symbol `sym` (a token for
  /// lexical rules, a label for unary ones), with probabilities.
  pub fn parents_of_single(&self, sym: &str) -> Option<&BTreeMap<String, f64>> {
    let key = [sym.to_string()];
    self.reverse_rules.get(&key[..])
  }

  /// Parents that can rewrite to the pair `left right`, with probabilities.
  pub fn parents_of_pair(&self, left: &str, right: &str) -> Option<&BTreeMap<String, f64>> {
    let key = [left.to_string(), right.to_string()];
    self.reverse_rules.get(&key[..])
  }

  /// Whether `token` was observed in training.
  pub fn knows_token(&self, token: &str) -> bool {
    self.terminals.contains(token)
  }
}

impl fmt::Display for Grammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "//** start: {}", self.start)?;
    write!(f, "//** parts of speech:")?;
    for pos in self.part_of_speech.iter() {
      write!(f, " {}", pos)?;
    }
    writeln!(f)?;

    for (parent, rhs_probs) in self.rules.iter() {
      for (rhs, prob) in rhs_probs.iter() {
        write!(f, "{} ->", parent)?;
        for sym in rhs.iter() {
          write!(f, " {}", sym)?;
        }
        writeln!(f, " # {}", prob)?;
      }
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse_tree::parse_treebank;

  fn corpus() -> Vec<SynTree> {
    parse_treebank(
      r"
        (S (NP (DT the) (NN dog)) (VP (VBZ barks)))
        (S (NP (DT the) (NN cat)) (VP (VBZ sleeps)))
        (S (NP (NNP John)) (VP (VBZ sleeps)))
      ",
    )
    .unwrap()
  }

  #[test]
  fn test_start_symbol_from_first_tree() {
    let g = Grammar::induce(&corpus()).unwrap();
    assert_eq!(g.start, "S");
  }

  #[test]
  fn test_rule_probabilities_sum_to_one() {
    let g = Grammar::induce(&corpus()).unwrap();
    for (parent, rhs_probs) in &g.rules {
      let sum: f64 = rhs_probs.values().sum();
      assert!(
        (sum - 1.0).abs() < SUM_TOLERANCE,
        "rules for {} sum to {}",
        parent,
        sum
      );
    }
  }

  #[test]
  fn test_counts_normalized_per_parent() {
    let g = Grammar::induce(&corpus()).unwrap();
    // NP occurs three times: twice as DT NN, once as NNP.
    let np = &g.rules["NP"];
    let dt_nn = np[&vec!["DT".to_string(), "NN".to_string()]];
    let nnp = np[&vec!["NNP".to_string()]];
    assert!((dt_nn - 2.0 / 3.0).abs() < SUM_TOLERANCE);
    assert!((nnp - 1.0 / 3.0).abs() < SUM_TOLERANCE);
    assert_eq!(g.rule_totals["NP"], 3);
  }

  #[test]
  fn test_terminals_and_parts_of_speech() {
    let g = Grammar::induce(&corpus()).unwrap();
    assert!(g.knows_token("dog"));
    assert!(g.knows_token("barks"));
    assert!(!g.knows_token("NP"));
    for pos in ["DT", "NN", "NNP", "VBZ"] {
      assert!(g.part_of_speech.contains(pos), "{} should be a POS", pos);
    }
    assert!(!g.part_of_speech.contains("NP"));
    assert!(!g.part_of_speech.contains("S"));
  }

  #[test]
  fn test_mixed_parent_is_not_a_part_of_speech() {
    // X heads both a lexical rule and a branching one; it must not be a POS
    // even though it has a lexical rule.
    let trees = parse_treebank(
      r"
        (S (X foo) (X (Y bar)))
      ",
    )
    .unwrap();
    let g = Grammar::induce(&trees).unwrap();
    assert!(!g.part_of_speech.contains("X"));
    assert!(g.part_of_speech.contains("Y"));
  }

  #[test]
  fn test_unknown_fallback_is_min_rule_probability() {
    let g = Grammar::induce(&corpus()).unwrap();
    // VBZ: sleeps 2/3, barks 1/3 -> floor 1/3.
    assert!((g.unknown_fallback["VBZ"] - 1.0 / 3.0).abs() < SUM_TOLERANCE);
  }

  #[test]
  fn test_reverse_rules_are_transpose() {
    let g = Grammar::induce(&corpus()).unwrap();
    g.validate().unwrap();
    let parents = g.parents_of_pair("NP", "VP").unwrap();
    assert_eq!(parents.len(), 1);
    assert!((parents["S"] - 1.0).abs() < SUM_TOLERANCE);
    let lexical = g.parents_of_single("dog").unwrap();
    assert!((lexical["NN"] - 0.5).abs() < SUM_TOLERANCE);
  }

  #[test]
  fn test_empty_corpus_is_inconsistent() {
    assert!(matches!(
      Grammar::induce(&[]),
      Err(Error::GrammarInconsistency(_))
    ));
  }
}
