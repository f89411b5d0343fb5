#![allow(clippy::uninlined_format_args)]

use parsley::{read, MatchError, Options, Rule, Sequence, Value, Variables};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "parsley-tool")]
struct Opt {
    /// The rule, in source form.
    rule: String,

    /// Match options: 'c' for case-sensitive, 'p' for partial.
    #[structopt(long, short, parse(from_str = Options::from))]
    flags: Option<Options>,

    /// Dump the compiled rule tree to stdout.
    #[structopt(long)]
    dump_tree: bool,

    /// Match inputs as byte arrays rather than strings.
    #[structopt(long, conflicts_with = "block")]
    bytes: bool,

    /// Read inputs as rule source and match the values as lists.
    #[structopt(long, conflicts_with = "bytes")]
    block: bool,

    /// Print the variables bound by each match.
    #[structopt(long)]
    vars: bool,

    /// The inputs to match against.
    #[structopt(conflicts_with_all = &["bench", "file"])]
    inputs: Vec<String>,

    /// Match against the contents of a specified file.
    #[structopt(long, conflicts_with_all = &["bench", "inputs"])]
    file: Option<PathBuf>,

    /// Benchmark matching against the contents of a specified file.
    #[structopt(long, conflicts_with_all = &["file", "inputs"])]
    bench: Option<PathBuf>,
}

impl Opt {
    fn subject(&self, input: &str) -> Result<Sequence, MatchError> {
        if self.bytes {
            Ok(Sequence::from(input.as_bytes()))
        } else if self.block {
            Ok(Sequence::List(read(input)?))
        } else {
            Ok(Sequence::from(input))
        }
    }
}

fn format_vars(vars: &Variables) -> String {
    let mut pairs: Vec<_> = vars.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<_>>()
        .join(", ")
}

fn exec_rule_on_input(rule: &Rule, args: &Opt, input: &str) {
    let subject = match args.subject(input) {
        Ok(subject) => subject,
        Err(err) => {
            println!("Bad input: {}", err);
            return;
        }
    };
    let mut vars = Variables::new();
    match rule.parse_with(&subject, args.flags.unwrap_or_default(), &mut vars) {
        Ok(Some(Value::Void)) => println!("Match"),
        Ok(Some(value)) => println!("Match: {}", value),
        Ok(None) => println!("No match"),
        Err(err) => println!("Error: {}", err),
    }
    if args.vars {
        println!("Variables: {}", format_vars(&vars));
    }
}

fn bench_rule_on_path(rule: &Rule, args: &Opt, path: &Path) {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            println!("{}: {}", err, path.display());
            return;
        }
    };
    let subject = match args.subject(&contents) {
        Ok(subject) => subject,
        Err(err) => {
            println!("Bad input: {}", err);
            return;
        }
    };
    let options = args.flags.unwrap_or_default();
    // Warmup
    let _ = rule.parse_with(&subject, options, &mut Variables::new());
    let start = Instant::now();
    for _ in 0..25 {
        let _ = rule.parse_with(&subject, options, &mut Variables::new());
    }
    let duration = start.elapsed();
    println!("{} ms", duration.as_millis());
}

fn main() -> Result<(), MatchError> {
    let args = Opt::from_args();

    let rule = Rule::from_source(&args.rule)?;
    if args.dump_tree {
        println!("Rule tree:\n{}", rule);
    }

    if let Some(ref path) = args.file {
        match fs::read_to_string(path) {
            Ok(contents) => exec_rule_on_input(&rule, &args, contents.as_str()),
            Err(err) => println!("{}: {}", err, path.display()),
        };
    } else if let Some(ref path) = args.bench {
        bench_rule_on_path(&rule, &args, path);
    } else {
        for input in &args.inputs {
            exec_rule_on_input(&rule, &args, input);
        }
    }
    Ok(())
}
