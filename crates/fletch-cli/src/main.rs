//! `fletch` — a small CLI wrapping `fletch_core`/`fletch_frontend`.
//!
//! Uses `clap`'s builder API rather than the derive macros.

use std::{fs, io::Write, path::PathBuf, process::ExitCode};

use clap::{Arg, ArgAction, Command};
use fletch_core::{driver::DriverOptions, FletchError};

fn cli() -> Command {
    Command::new("fletch")
        .about("Compiles a PEG grammar into a recursive-descent parser in C")
        .subcommand_required(true)
        .subcommand(
            Command::new("build")
                .about("Emits a C source file implementing the grammar's parser")
                .arg(Arg::new("grammar").required(true).num_args(1..).help("Grammar source file(s)"))
                .arg(Arg::new("output").short('o').long("output").value_name("FILE").help("Write generated C here instead of stdout"))
                .arg(Arg::new("no-lines").long("no-lines").action(ArgAction::SetTrue).help("Suppress #line directives in action trampolines"))
                .arg(Arg::new("trace").long("trace").action(ArgAction::SetTrue).help("Emit yyprintf trace hooks in every rule")),
        )
        .subcommand(
            Command::new("check")
                .about("Parses and analyzes the grammar without emitting output")
                .arg(Arg::new("grammar").required(true).num_args(1..).help("Grammar source file(s)")),
        )
}

fn read_and_merge(paths: &[&str]) -> Result<fletch_core::Grammar, String> {
    // Multiple files are concatenated before parsing; a grammar split
    // across files is just textually larger source to the front end.
    let mut combined = String::new();
    for path in paths {
        let text = fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
        combined.push_str(&text);
        combined.push('\n');
    }
    fletch_frontend::parse(&combined).map_err(|e| format!("parse error: {e}"))
}

fn run_build(matches: &clap::ArgMatches) -> ExitCode {
    let grammars: Vec<&str> = matches.get_many::<String>("grammar").unwrap().map(String::as_str).collect();
    let mut grammar = match read_and_merge(&grammars) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let options = DriverOptions {
        line_directives: !matches.get_flag("no-lines"),
        trace: matches.get_flag("trace"),
        source_file: grammars.first().map(|s| s.to_string()).unwrap_or_default(),
        ..DriverOptions::default()
    };

    let mut buf = Vec::new();
    let diagnostics = match fletch_core::compile(&mut grammar, &mut buf, &options) {
        Ok(d) => d,
        Err(FletchError::Io(msg)) => {
            eprintln!("error: {msg}");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let _ = diagnostics.dump(std::io::stderr());

    match matches.get_one::<String>("output") {
        Some(path) => {
            if let Err(e) = fs::write(PathBuf::from(path), &buf) {
                eprintln!("error: could not write {path}: {e}");
                return ExitCode::FAILURE;
            }
        }
        None => {
            let _ = std::io::stdout().write_all(&buf);
        }
    }

    if diagnostics.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run_check(matches: &clap::ArgMatches) -> ExitCode {
    let grammars: Vec<&str> = matches.get_many::<String>("grammar").unwrap().map(String::as_str).collect();
    let mut grammar = match read_and_merge(&grammars) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if grammar.start.is_none() {
        eprintln!("error: grammar has no start rule");
        return ExitCode::FAILURE;
    }

    let analysis = fletch_core::analyzer::analyze(&mut grammar);
    let _ = analysis.diagnostics.dump(std::io::stderr());
    if analysis.diagnostics.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    match matches.subcommand() {
        Some(("build", sub)) => run_build(sub),
        Some(("check", sub)) => run_check(sub),
        _ => unreachable!("subcommand_required(true) guarantees one of the above matched"),
    }
}
