use regex::Regex;
/// Simple recursive-descent parsing of bracketed treebank lines
use std::str::FromStr;

use crate::error::Error;
use crate::syntree::SynTree;

type Infallible<'a, T> = (T, &'a str);
type ParseResult<'a, T> = Result<(T, &'a str), Error>;

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

fn malformed(msg: String) -> Error {
  Error::MalformedTree(msg)
}

/// Try to consume a regex, returning None if it doesn't match
fn optional_re<'a>(re: &'static Regex, s: &'a str) -> Infallible<'a, Option<&'a str>> {
  if let Some(caps) = re.captures(s) {
    let m = caps.get(0).unwrap();
    if m.start() > 0 {
      return (None, s);
    }
    let (_, rest) = s.split_at(m.end());
    (Some(m.as_str()), rest)
  } else {
    (None, s)
  }
}

/// Try to consume a regex, failing if it doesn't match
fn needed_re<'a>(re: &'static Regex, s: &'a str) -> ParseResult<'a, &'a str> {
  if let (Some(c), rest) = optional_re(re, s) {
    Ok((c, rest))
  } else {
    Err(malformed(format!("couldn't match {} at {:?}", re, s)))
  }
}

/// Try to consume a char, returning None if it doesn't match
fn optional_char(c: char, s: &str) -> Infallible<'_, Option<char>> {
  let mut iter = s.char_indices().peekable();
  if let Some((_, c1)) = iter.next() {
    if c == c1 {
      let rest = if let Some((idx, _)) = iter.peek() {
        s.split_at(*idx).1
      } else {
        ""
      };
      return (Some(c), rest);
    }
  }
  (None, s)
}

/// Try to consume a char, failing if it doesn't match
fn needed_char(c: char, s: &str) -> ParseResult<'_, char> {
  if let (Some(c), rest) = optional_char(c, s) {
    Ok((c, rest))
  } else {
    Err(malformed(format!("couldn't match {} at {:?}", c, s)))
  }
}

fn skip_whitespace(s: &str) -> &str {
  regex_static!(WHITESPACE, r"\s+");
  optional_re(&WHITESPACE, s).1
}

/// Tries to parse a label or word over the treebank token alphabet.
/// Numeric-looking leaves stay strings; nothing is interpreted here.
fn parse_token(s: &str) -> ParseResult<'_, &str> {
  regex_static!(TOKEN, r"[a-zA-Z0-9./_:;*+=!<>@&`',?%#$\\-]+");
  needed_re(&TOKEN, s).map_err(|e| malformed(format!("token: {}", e)))
}

/// Consumes an optional `[display]` annotation before a leaf token. The
/// annotation carries no structure and is dropped.
fn skip_display(s: &str) -> ParseResult<'_, ()> {
  if let (Some(_), s) = optional_char('[', s) {
    let s = skip_whitespace(s);
    let (_, s) = parse_token(s)?;
    let s = skip_whitespace(s);
    let (_, s) = needed_char(']', s)?;
    Ok(((), s))
  } else {
    Ok(((), s))
  }
}

/// `(LABEL child ...)` where the children are either exactly one bare token
/// (a terminal) or one or more parenthesized sub-nodes (a nonterminal).
/// Mixing the two forms is malformed.
fn parse_node(s: &str) -> ParseResult<'_, SynTree> {
  let (_, s) = needed_char('(', s)?;
  let s = skip_whitespace(s);
  let (label, s) = parse_token(s).map_err(|e| malformed(format!("node label: {}", e)))?;
  let rem = skip_whitespace(s);

  if rem.starts_with('(') {
    let mut children = Vec::new();
    let mut rem = rem;
    loop {
      rem = skip_whitespace(rem);
      if let (Some(_), s) = optional_char(')', rem) {
        rem = s;
        break;
      }
      let (child, s) = parse_node(rem)
        .map_err(|e| malformed(format!("child of {}: {}", label, e)))?;
      children.push(child);
      rem = s;
    }
    Ok((SynTree::Branch(label.to_string(), children), rem))
  } else {
    let ((), s) = skip_display(rem)?;
    let s = skip_whitespace(s);
    let (token, s) =
      parse_token(s).map_err(|e| malformed(format!("{} has no children: {}", label, e)))?;
    let s = skip_whitespace(s);
    let (_, s) = needed_char(')', s)
      .map_err(|e| malformed(format!("{} must hold exactly one token: {}", label, e)))?;
    Ok((SynTree::Leaf(label.to_string(), token.to_string()), s))
  }
}

impl FromStr for SynTree {
  type Err = Error;

  /// Parses one bracketed treebank line, e.g.
  /// `(TOP (INTJ (UH damn) (. !)))`.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = skip_whitespace(s);
    let (tree, rest) = parse_node(s)?;
    let rest = skip_whitespace(rest);
    if rest.is_empty() {
      Ok(tree)
    } else {
      Err(malformed(format!("trailing input after tree: {:?}", rest)))
    }
  }
}

/// Parses every nonblank line of a treebank dump into a tree, failing fast
/// on the first malformed line.
pub fn parse_treebank(src: &str) -> Result<Vec<SynTree>, Error> {
  src
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .map(str::parse)
    .collect()
}
