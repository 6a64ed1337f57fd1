use thiserror::Error;

/// Everything that can go wrong between reading a treebank and extracting
/// a best parse.
#[derive(Debug, Error)]
pub enum Error {
  /// The bracketed front-end hit a structural problem. Induction propagates
  /// this unchanged rather than repairing the tree.
  #[error("malformed tree: {0}")]
  MalformedTree(String),

  /// A parent's counts or normalized probabilities don't add up. Should not
  /// happen for a grammar produced by `induce`.
  #[error("inconsistent grammar: {0}")]
  GrammarInconsistency(String),

  /// The start symbol doesn't cover the requested span.
  #[error("no parse found for span {begin}..{end}")]
  NoParseFound { begin: usize, end: usize },

  /// No tagger heuristic matched. Unreachable while the table keeps its
  /// catch-all row, but the tagger's contract stays total.
  #[error("no tag heuristic matched token {0:?}")]
  UnresolvedToken(String),

  /// Unary closure kept reporting progress past its pass cap.
  #[error("unary closure failed to converge after {0} passes")]
  ClosureDiverged(usize),

  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error(transparent)]
  Json(#[from] serde_json::Error),
}
