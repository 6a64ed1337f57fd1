use std::env;
use std::fs;
use std::io;
use std::io::Write;
use std::process;

use tracing_subscriber::EnvFilter;

use treeprob::{Error, Grammar, extract, parse_treebank};

fn usage(prog_name: &str) -> String {
  format!(
    r"Usage: {} TREEBANK [options]

Options:
  -h, --help          Print this message
  -c, --chart         Print the parse chart for each sentence
  -g, --grammar FILE  Save the induced grammar to FILE as JSON
  -l, --load FILE     Load a grammar from FILE instead of inducing",
    prog_name
  )
}

fn parse(g: &Grammar, sentence: &str, print_chart: bool) -> Result<(), Error> {
  let tokens = sentence.split_whitespace().collect::<Vec<_>>();

  let chart = g.parse_chart(&tokens)?;

  if print_chart {
    println!("chart:\n{}", chart);
  }

  match extract(&chart, g, 0, tokens.len()) {
    Ok(tree) => {
      let prob = chart
        .get(0, tokens.len(), &g.start)
        .map(|item| item.probability())
        .unwrap_or(0.0);
      println!("{}", tree);
      println!("p = {}", prob);
    }
    Err(Error::NoParseFound { .. }) => println!("No parse found"),
    Err(e) => return Err(e),
  }
  println!();

  Ok(())
}

struct Args {
  filename: String,
  print_chart: bool,
  save_grammar: Option<String>,
  load_grammar: Option<String>,
}

impl Args {
  fn make_error_message(msg: &str, prog_name: impl AsRef<str>) -> String {
    format!("argument error: {}.\n\n{}", msg, usage(prog_name.as_ref()))
  }

  fn parse(v: Vec<String>) -> Result<Self, String> {
    if v.is_empty() {
      return Err(Self::make_error_message("bad argument vector", "treeprob"));
    }

    let args_len = v.len();
    let mut iter = v.into_iter();
    let prog_name = iter.next().unwrap();

    if args_len < 2 {
      return Err(Self::make_error_message("not enough arguments", prog_name));
    }

    let mut filename: Option<String> = None;
    let mut print_chart = false;
    let mut save_grammar: Option<String> = None;
    let mut load_grammar: Option<String> = None;

    while let Some(o) = iter.next() {
      if o == "-h" || o == "--help" {
        println!("{}", usage(&prog_name));
        process::exit(0);
      } else if o == "-c" || o == "--chart" {
        print_chart = true;
      } else if o == "-g" || o == "--grammar" {
        match iter.next() {
          Some(path) => save_grammar = Some(path),
          None => return Err(Self::make_error_message("-g needs a file", prog_name)),
        }
      } else if o == "-l" || o == "--load" {
        match iter.next() {
          Some(path) => load_grammar = Some(path),
          None => return Err(Self::make_error_message("-l needs a file", prog_name)),
        }
      } else if filename.is_none() {
        filename = Some(o);
      } else {
        return Err(Self::make_error_message("invalid arguments", prog_name));
      }
    }

    if let Some(filename) = filename {
      Ok(Self {
        filename,
        print_chart,
        save_grammar,
        load_grammar,
      })
    } else {
      Err(Self::make_error_message("missing treebank file", prog_name))
    }
  }
}

fn main() -> Result<(), Error> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let opts = match Args::parse(env::args().collect()) {
    Ok(opts) => opts,
    Err(msg) => {
      eprintln!("{}", msg);
      process::exit(255);
    }
  };

  let g = match &opts.load_grammar {
    Some(path) => Grammar::load(path)?,
    None => {
      let corpus = fs::read_to_string(&opts.filename)?;
      let trees = parse_treebank(&corpus)?;
      Grammar::induce(&trees)?
    }
  };

  if let Some(path) = &opts.save_grammar {
    g.save(path)?;
    eprintln!("saved grammar to {}", path);
  }

  let mut input = String::new();
  loop {
    print!("> ");
    io::stdout().flush()?;

    match io::stdin().read_line(&mut input) {
      Ok(_) => {
        if input.is_empty() {
          // ctrl+d
          return Ok(());
        }
        if !input.trim().is_empty() {
          parse(&g, input.trim(), opts.print_chart)?;
        }
        input.clear();
      }
      Err(error) => return Err(error.into()),
    }
  }
}
