//! Command-line front end for `ccgen`.
//!
//! Three subcommands, mirroring `dandy-cli`'s per-command dispatch but for
//! this tool's own build/run split (`examples/original_source/src/frontend/cli.py`'s
//! `build`/`compile`/`test-compiler`): `build` generates a [`ccgen::CompilerSpec`]
//! from a pair of rule files and serializes it; `compile` builds (or loads) one
//! and runs it over a source file; `test-compiler` builds one and runs it over
//! every `.src` file in a directory.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "ccgen", about = "Compiler-compiler: lexer/grammar rules to a TAC-emitting LL(1) compiler")]
struct Cli {
    /// Repeat for more log output: once for info, twice for debug, three+ for trace.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a compiler artifact from a lexer-rule file and a grammar-rule file.
    Build {
        lexer_rules: PathBuf,
        grammar_rules: PathBuf,
        /// Where to write the serialized compiler artifact.
        #[arg(short, long, default_value = "compiler.ccgen")]
        output: PathBuf,
    },
    /// Compile one source file, building the compiler artifact first (or loading one with `-c`).
    Compile {
        lexer_rules: PathBuf,
        grammar_rules: PathBuf,
        source: PathBuf,
        /// Where to write the emitted three-address code (stdout if omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Load a previously-built artifact instead of rebuilding from the rule files.
        #[arg(short = 'c', long)]
        compiler: Option<PathBuf>,
    },
    /// Build the compiler and run it over every `.src` file in a directory.
    TestCompiler {
        lexer_rules: PathBuf,
        grammar_rules: PathBuf,
        /// Directory of test programs (default: ./programs).
        #[arg(short = 'p', long, default_value = "programs")]
        program_dir: PathBuf,
        /// Directory to write each program's emitted TAC into (default: ./test_outputs).
        #[arg(short = 'o', long, default_value = "test_outputs")]
        output_dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();

    let result = match cli.command {
        Commands::Build { lexer_rules, grammar_rules, output } => {
            commands::build(&lexer_rules, &grammar_rules, &output)
        }
        Commands::Compile { lexer_rules, grammar_rules, source, output, compiler } => {
            commands::compile(&lexer_rules, &grammar_rules, &source, output.as_deref(), compiler.as_deref())
        }
        Commands::TestCompiler { lexer_rules, grammar_rules, program_dir, output_dir } => {
            commands::test_compiler(&lexer_rules, &grammar_rules, &program_dir, &output_dir)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
