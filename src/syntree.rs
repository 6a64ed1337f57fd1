use std::fmt;

/// A labeled syntax tree, as read from a treebank or rebuilt from a chart.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum SynTree {
  /// A nonterminal: label plus ordered, non-empty children.
  Branch(String, Vec<SynTree>),
  /// A terminal: part-of-speech label paired with exactly one token.
  Leaf(String, String),
}

impl SynTree {
  pub fn label(&self) -> &str {
    match self {
      Self::Branch(label, _) => label,
      Self::Leaf(label, _) => label,
    }
  }

  pub fn is_leaf(&self) -> bool {
    matches!(self, Self::Leaf(_, _))
  }

  pub fn is_branch(&self) -> bool {
    matches!(self, Self::Branch(_, _))
  }

  pub fn get_leaf(&self) -> Option<(&str, &str)> {
    match self {
      Self::Leaf(label, token) => Some((label, token)),
      _ => None,
    }
  }

  pub fn get_branch(&self) -> Option<(&str, &[SynTree])> {
    match self {
      Self::Branch(label, children) => Some((label, children)),
      _ => None,
    }
  }

  pub fn into_branch(self) -> Option<(String, Vec<SynTree>)> {
    match self {
      Self::Branch(label, children) => Some((label, children)),
      _ => None,
    }
  }

  /// The leaf tokens in left-to-right order, i.e. the sentence this tree
  /// spans.
  pub fn tokens(&self) -> Vec<&str> {
    let mut out = Vec::new();
    self.collect_tokens(&mut out);
    out
  }

  fn collect_tokens<'a>(&'a self, out: &mut Vec<&'a str>) {
    match self {
      Self::Leaf(_, token) => out.push(token),
      Self::Branch(_, children) => {
        for child in children {
          child.collect_tokens(out);
        }
      }
    }
  }
}

impl fmt::Display for SynTree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Leaf(label, token) => write!(f, "({} {})", label, token),
      Self::Branch(label, children) => {
        write!(f, "({}", label)?;
        for child in children {
          write!(f, " {}", child)?;
        }
        write!(f, ")")
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> SynTree {
    SynTree::Branch(
      "S".to_string(),
      vec![
        SynTree::Leaf("NP".to_string(), "John".to_string()),
        SynTree::Leaf("VP".to_string(), "sleeps".to_string()),
      ],
    )
  }

  #[test]
  fn test_display_round_brackets() {
    assert_eq!(sample().to_string(), "(S (NP John) (VP sleeps))");
  }

  #[test]
  fn test_tokens_in_order() {
    assert_eq!(sample().tokens(), vec!["John", "sleeps"]);
  }
}
