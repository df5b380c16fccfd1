//! Command-line interface for yapp-calc.
//!
//! Evaluates calculator source from a file or standard input, printing one
//! result per line, then any diagnostics and the final variable bindings.
//! Engine traces go to the `log` facade; run with `RUST_LOG=yapp::trace=trace`
//! together with `--debug` to see them.

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use yapp::{Outcome, TraceFlags};
use yapp_calc::{Calc, CalcParser};

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Command
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluates calculator statements
    Eval {
        /// Input file (standard input when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Trace categories: a bitmask such as 0x1f, or names such as
        /// "state,action,recovery"
        #[arg(short, long, default_value = "none")]
        debug: TraceFlags,
    },
}

fn read_source(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("can't open {:?}", path))
        }
        None => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .context("can't read standard input")?;
            Ok(source)
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Eval { input, debug } => {
            let source = read_source(input.as_ref())?;
            let mut calc = Calc::new();
            let mut parser = CalcParser::try_new().context("can't load calculator tables")?;
            parser.set_debug(debug);
            let outcome = parser.eval(&source, &mut calc)?;

            for result in &calc.results {
                match result {
                    Some(n) => println!("{n}"),
                    None => println!("error"),
                }
            }
            for message in &calc.errors {
                eprintln!("{message}");
            }
            for (name, value) in calc.symtab.iter() {
                println!("{name} = {value}");
            }
            log::info!("{:?}", parser.stats());

            if let Outcome::Fail(failure) = outcome {
                anyhow::bail!("parse failed: {failure:?}");
            }
        }
    }
    Ok(())
}
