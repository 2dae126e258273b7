use log::{error, info, warn};
use std::{fs, io::Read, path::PathBuf, process};

use ll1_expr::grammar::pretty_print::sets_to_plaintext;
use ll1_expr::{Analysis, Error, Grammar, Result};

const OUTPUTS: [&str; 6] = ["prod", "first", "follow", "nff", "ll1", "trace"];

fn print_help() {
    println!("Usage: ll1-expr outputs [options] [input file]");
    println!("outputs:");
    println!("  prod: Productions");
    println!("  first: FIRST sets");
    println!("  follow: FOLLOW sets");
    println!("  nff: Nullable first and follow");
    println!("  ll1: LL(1) parsing table");
    println!("  trace: Parse the input and print every step");
    println!("options:");
    println!("  -h: Print this help");
    println!("  -l: Print in LaTeX format");
    println!("  -j: Print in JSON format");
    println!("  -g <file>: Use the grammar in <file> instead of the arithmetic one");
    println!("  -o <dir>: Save grammar, first, follow and table as JSON into <dir>");
    println!("  --strict: Fail when the grammar is not LL(1)");
    println!("  -v: More log output (repeatable)");
    println!("  -q: No log output");
    println!("The input is read from stdin when no file is given.");
}

enum OutputFormat {
    Plain,
    LaTeX,
    JSON,
}

struct Options {
    outputs: Vec<String>,
    format: OutputFormat,
    grammar: Option<PathBuf>,
    persist: Option<PathBuf>,
    strict: bool,
    verbosity: usize,
    quiet: bool,
    input: Option<PathBuf>,
}

/// `None` when help was requested or the arguments make no sense.
fn parse_args(args: &[String]) -> Option<Options> {
    let mut i: usize = 0;
    let mut outputs: Vec<String> = Vec::new();
    while i < args.len() && OUTPUTS.contains(&args[i].as_str()) {
        outputs.push(args[i].clone());
        i += 1;
    }

    let mut options = Options {
        outputs,
        format: OutputFormat::Plain,
        grammar: None,
        persist: None,
        strict: false,
        verbosity: 1,
        quiet: false,
        input: None,
    };

    while i < args.len() && args[i].starts_with('-') {
        match args[i].as_str() {
            "-h" | "--help" => return None,
            "-l" => options.format = OutputFormat::LaTeX,
            "-j" => options.format = OutputFormat::JSON,
            "-g" => {
                i += 1;
                options.grammar = Some(PathBuf::from(args.get(i)?));
            }
            "-o" => {
                i += 1;
                options.persist = Some(PathBuf::from(args.get(i)?));
            }
            "--strict" => options.strict = true,
            "-q" => options.quiet = true,
            s if s.len() > 1 && s[1..].chars().all(|c| c == 'v') => {
                options.verbosity += s.len() - 1
            }
            _ => return None,
        }
        i += 1;
    }

    if i + 1 < args.len() || (options.outputs.is_empty() && options.persist.is_none()) {
        return None;
    }
    options.input = args.get(i).map(PathBuf::from);

    Some(options)
}

fn read_input(path: &Option<PathBuf>) -> Result<String> {
    match path {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

/// Prints every requested output; `Ok(false)` when the input was rejected.
fn run(options: &Options) -> Result<bool> {
    let grammar = match &options.grammar {
        Some(path) => Grammar::parse(&fs::read_to_string(path)?)?,
        None => Grammar::arithmetic(),
    };
    let analysis = Analysis::new(grammar);
    info!(
        "{} table cells, {} conflict(s)",
        analysis.table().cell_count(),
        analysis.table().conflicts().len()
    );
    if options.strict {
        analysis.table().ensure_ll1()?;
    }
    if let Some(dir) = &options.persist {
        analysis.persist(dir)?;
    }

    let g = analysis.grammar();
    let mut accepted = true;
    for output in &options.outputs {
        let text = match output.as_str() {
            "prod" => {
                let t = g.to_production_output_vec();
                match options.format {
                    OutputFormat::Plain => t.to_plaintext(),
                    OutputFormat::LaTeX => t.to_latex(),
                    OutputFormat::JSON => serde_json::to_string(&t)?,
                }
            }
            "first" => match options.format {
                OutputFormat::JSON => serde_json::to_string(analysis.first_sets())?,
                _ => sets_to_plaintext(analysis.first_sets().iter(), "FIRST"),
            },
            "follow" => match options.format {
                OutputFormat::JSON => serde_json::to_string(analysis.follow_sets())?,
                _ => sets_to_plaintext(analysis.follow_sets().iter(), "FOLLOW"),
            },
            "nff" => {
                let t =
                    g.to_non_terminal_output_vec(analysis.first_sets(), analysis.follow_sets());
                match options.format {
                    OutputFormat::Plain => t.to_plaintext(),
                    OutputFormat::LaTeX => t.to_latex(),
                    OutputFormat::JSON => t.to_json()?,
                }
            }
            "ll1" => {
                let t = analysis.table();
                match options.format {
                    OutputFormat::Plain => t.to_plaintext(),
                    OutputFormat::LaTeX => t.to_latex(),
                    OutputFormat::JSON => serde_json::to_string(t)?,
                }
            }
            "trace" => {
                let input = read_input(&options.input)?;
                info!("parsing {:?}", input.trim());
                let report = analysis.parse_str(&input);
                if let Some(e) = report.error() {
                    warn!("{}", e);
                    accepted = false;
                }
                match options.format {
                    OutputFormat::Plain => report.to_plaintext(),
                    OutputFormat::LaTeX => report.to_latex(),
                    OutputFormat::JSON => serde_json::to_string(&report)?,
                }
            }
            _ => continue,
        };
        println!("{}", text);
    }

    Ok(accepted)
}

fn main() {
    let args = std::env::args().skip(1).collect::<Vec<String>>();
    let options = match parse_args(&args) {
        Some(options) => options,
        None => {
            print_help();
            return;
        }
    };

    if let Err(e) = stderrlog::new()
        .module(module_path!())
        .quiet(options.quiet)
        .verbosity(options.verbosity)
        .init()
    {
        eprintln!("cannot initialize logging: {}", e);
    }

    match run(&options) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            if let Error::NotLL1(conflicts) = &e {
                for c in conflicts {
                    error!(
                        "[{}, {}]: {} / {}",
                        c.non_terminal, c.lookahead, c.previous, c.chosen
                    );
                }
            }
            error!("{}", e);
            process::exit(2);
        }
    }
}
