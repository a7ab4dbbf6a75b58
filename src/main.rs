// ==============================================================================
// CLI for the Python Similarity Scorer
// ==============================================================================
//
//   pysimilar INPUT OUTPUT
//
// INPUT lists one pair of Python files per line; OUTPUT receives one score
// per pair.

use std::path::PathBuf;
use std::process::ExitCode;

use pysimilar::Comparison;
use pysimilar::batch::{self, Manifest};

const USAGE: &str = "usage: pysimilar INPUT OUTPUT";

const HELP: &str = "\
Score how similar pairs of Python programs are, ignoring naming and formatting.

usage: pysimilar INPUT OUTPUT

arguments:
  INPUT    file listing one pair of Python files per line, separated by whitespace
  OUTPUT   file to write one score per pair to, with three decimals

options:
  -h, --help   print this help and exit

A score is the edit distance between the canonical forms of the two files,
divided by the length of the first one. 0.000 means identical after renaming.
";

struct Args {
    input: PathBuf,
    output: PathBuf,
}

enum Command {
    Run(Args),
    Help,
}

fn parse_args() -> Result<Command, lexopt::Error> {
    use lexopt::prelude::*;

    let mut input = None;
    let mut output = None;
    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => return Ok(Command::Help),
            Value(value) if input.is_none() => input = Some(PathBuf::from(value)),
            Value(value) if output.is_none() => output = Some(PathBuf::from(value)),
            _ => return Err(arg.unexpected()),
        }
    }

    Ok(Command::Run(Args {
        input: input.ok_or("missing argument INPUT")?,
        output: output.ok_or("missing argument OUTPUT")?,
    }))
}

// ==============================================================================
// Entry Point
// ==============================================================================

fn main() -> miette::Result<ExitCode> {
    miette::set_hook(Box::new(|_| {
        Box::new(miette::MietteHandlerOpts::new().build())
    }))?;

    let args = match parse_args() {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            print!("{HELP}");
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => {
            eprintln!("error: {e}\n{USAGE}\nrun 'pysimilar --help' for more information");
            return Ok(ExitCode::from(2));
        }
    };

    let manifest = Manifest::read(&args.input)?;
    for warning in &manifest.warnings {
        eprintln!("{warning:?}");
    }

    batch::run(&manifest, &args.output, &Comparison::new())?;
    Ok(ExitCode::SUCCESS)
}
