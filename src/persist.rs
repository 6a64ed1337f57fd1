use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::grammar::{Grammar, Rhs};

/// Flat on-disk form of a grammar. JSON objects can't key on child-label
/// sequences, so rules become explicit records, and the reverse index is
/// rebuilt by transposition on load rather than stored twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedGrammar {
  pub start: String,
  pub terminals: Vec<String>,
  pub part_of_speech: Vec<String>,
  pub rule_totals: Vec<(String, u64)>,
  pub unknown_fallback: Vec<(String, f64)>,
  pub rules: Vec<SerializedRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedRule {
  pub parent: String,
  pub children: Vec<String>,
  pub probability: f64,
}

impl SerializedGrammar {
  pub fn from_grammar(grammar: &Grammar) -> Self {
    let rules = grammar
      .rules
      .iter()
      .flat_map(|(parent, rhs_probs)| {
        rhs_probs.iter().map(|(rhs, prob)| SerializedRule {
          parent: parent.clone(),
          children: rhs.clone(),
          probability: *prob,
        })
      })
      .collect();
    Self {
      start: grammar.start.clone(),
      terminals: grammar.terminals.iter().cloned().collect(),
      part_of_speech: grammar.part_of_speech.iter().cloned().collect(),
      rule_totals: grammar
        .rule_totals
        .iter()
        .map(|(parent, total)| (parent.clone(), *total))
        .collect(),
      unknown_fallback: grammar
        .unknown_fallback
        .iter()
        .map(|(pos, floor)| (pos.clone(), *floor))
        .collect(),
      rules,
    }
  }

  /// Rebuilds the in-memory grammar, including the reverse index, and
  /// re-validates it so a hand-edited file can't smuggle in probabilities
  /// that don't sum to 1.
  pub fn into_grammar(self) -> Result<Grammar, Error> {
    let mut rules: BTreeMap<String, BTreeMap<Rhs, f64>> = BTreeMap::new();
    let mut reverse_rules: BTreeMap<Rhs, BTreeMap<String, f64>> = BTreeMap::new();
    let mut nonterminals: BTreeSet<String> = BTreeSet::new();
    for rule in self.rules {
      nonterminals.insert(rule.parent.clone());
      reverse_rules
        .entry(rule.children.clone())
        .or_default()
        .insert(rule.parent.clone(), rule.probability);
      rules
        .entry(rule.parent)
        .or_default()
        .insert(rule.children, rule.probability);
    }

    let grammar = Grammar {
      start: self.start,
      terminals: self.terminals.into_iter().collect(),
      nonterminals,
      part_of_speech: self.part_of_speech.into_iter().collect(),
      rules,
      rule_totals: self.rule_totals.into_iter().collect(),
      unknown_fallback: self.unknown_fallback.into_iter().collect(),
      reverse_rules,
    };
    grammar.validate()?;
    Ok(grammar)
  }
}

impl Grammar {
  pub fn to_json(&self) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(&SerializedGrammar::from_grammar(self))?)
  }

  pub fn from_json(json: &str) -> Result<Self, Error> {
    serde_json::from_str::<SerializedGrammar>(json)?.into_grammar()
  }

  pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &SerializedGrammar::from_grammar(self))?;
    Ok(())
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let serialized: SerializedGrammar = serde_json::from_reader(reader)?;
    serialized.into_grammar()
  }
}
