use regex::Regex;

use crate::error::Error;

/// Candidate Penn Treebank tags for one heuristic, best guess first.
pub type Candidates = &'static [&'static str];

/// Tokens treated as currency markers and tagged `$`.
const CURRENCY_SYMBOLS: &[&str] = &[
  "$", "US$", "C$", "A$", "HK$", "NZ$", "#", "\u{a3}", "\u{a5}", "\u{20ac}", "\u{a2}",
];

#[derive(Debug, Clone, Copy)]
enum Heuristic {
  Numeric,
  CurrencySymbol,
  Suffix(&'static str),
  SingleChar,
  Capitalized,
  Hyphenated,
  Always,
}

impl Heuristic {
  fn matches(self, token: &str) -> bool {
    lazy_static! {
      static ref NUMERIC: Regex = Regex::new(r"^[+-]?[0-9][0-9.,/:\\-]*$").unwrap();
    }
    match self {
      Self::Numeric => NUMERIC.is_match(token),
      Self::CurrencySymbol => CURRENCY_SYMBOLS.contains(&token),
      Self::Suffix(suffix) => token.ends_with(suffix),
      Self::SingleChar => token.chars().count() == 1,
      Self::Capitalized => token.chars().next().is_some_and(char::is_uppercase),
      Self::Hyphenated => token.contains('-'),
      Self::Always => true,
    }
  }
}

/// The heuristic table. Evaluated strictly top to bottom, first match wins;
/// the order is load-bearing ("happier" must hit `-ier` before `-er`,
/// "Paris" hits `-s` before the capitalization row).
const TABLE: &[(Heuristic, Candidates)] = &[
  (Heuristic::Numeric, &["CD"]),
  (Heuristic::CurrencySymbol, &["$"]),
  (Heuristic::Suffix("able"), &["JJ"]),
  (Heuristic::Suffix("ed"), &["VBN", "VBD"]),
  (Heuristic::Suffix("y"), &["RB"]),
  (Heuristic::Suffix("ier"), &["RBR"]),
  (Heuristic::Suffix("iest"), &["RBS"]),
  (Heuristic::Suffix("ion"), &["NN", "NNP"]),
  (Heuristic::Suffix("er"), &["JJR", "NN"]),
  (Heuristic::Suffix("ist"), &["JJS", "NN", "NNP"]),
  (Heuristic::Suffix("ing"), &["VBG", "NN", "NNP", "JJ"]),
  (Heuristic::Suffix("s"), &["NNS", "NNPS", "VBZ"]),
  (Heuristic::SingleChar, &["SYM"]),
  (Heuristic::Capitalized, &["NNP", "NNPS"]),
  (Heuristic::Hyphenated, &["NNP", "JJ", "VB"]),
  (Heuristic::Always, &["NNP", "NNPS"]),
];

/// Guesses part-of-speech candidates for a token absent from training data.
/// Purely lexical and deterministic; knows nothing about any grammar, so
/// callers drop candidates the grammar has no part of speech for. The final
/// table row always matches, keeping the contract total.
pub fn guess_tags(token: &str) -> Result<Candidates, Error> {
  for &(heuristic, candidates) in TABLE {
    if heuristic.matches(token) {
      return Ok(candidates);
    }
  }
  Err(Error::UnresolvedToken(token.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_every_row() {
    let cases: &[(&str, Candidates)] = &[
      ("1,234.5", &["CD"]),
      ("$", &["$"]),
      ("payable", &["JJ"]),
      ("walked", &["VBN", "VBD"]),
      ("quickly", &["RB"]),
      ("happier", &["RBR"]),
      ("happiest", &["RBS"]),
      ("station", &["NN", "NNP"]),
      ("smaller", &["JJR", "NN"]),
      ("violinist", &["JJS", "NN", "NNP"]),
      ("running", &["VBG", "NN", "NNP", "JJ"]),
      ("tariffs", &["NNS", "NNPS", "VBZ"]),
      ("%", &["SYM"]),
      ("Berlin", &["NNP", "NNPS"]),
      ("blue-chip", &["NNP", "JJ", "VB"]),
      ("foo", &["NNP", "NNPS"]),
    ];
    for (token, want) in cases {
      assert_eq!(guess_tags(token).unwrap(), *want, "token {:?}", token);
    }
  }

  #[test]
  fn test_priority_order() {
    // Suffix rows outrank the capitalization row.
    assert_eq!(guess_tags("Paris").unwrap(), &["NNS", "NNPS", "VBZ"]);
    // The currency row outranks the single-char row.
    assert_eq!(guess_tags("\u{a3}").unwrap(), &["$"]);
    // Numerals with separators are still cardinal numbers.
    assert_eq!(guess_tags("3\\/4").unwrap(), &["CD"]);
  }

  #[test]
  fn test_deterministic_across_calls() {
    let first = guess_tags("frobnicate").unwrap();
    for _ in 0..8 {
      assert_eq!(guess_tags("frobnicate").unwrap(), first);
    }
  }
}
