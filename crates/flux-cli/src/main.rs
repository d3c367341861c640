use std::{env, fs, process::ExitCode};

use flux::{ErrorCollector, NoLimitTracker, Program, RunOutcome, Severity, Source, StdIo, Value, parse, run_source, tokenize_all};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let mut file_path: Option<&str> = None;
    let mut show_tokens = false;
    let mut show_ast = false;
    let mut no_color = false;

    for arg in &args[1..] {
        match arg.as_str() {
            "-tokens" => show_tokens = true,
            "-ast" => show_ast = true,
            "-no-color" => no_color = true,
            other => file_path = Some(other),
        }
    }

    let Some(file_path) = file_path else {
        eprintln!("usage: interp <source-file> [-tokens] [-ast] [-no-color]");
        return ExitCode::FAILURE;
    };

    let text = match fs::read_to_string(file_path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("error reading {file_path}: {err}");
            return ExitCode::FAILURE;
        }
    };
    let source = Source::new(file_path, text);

    if show_tokens {
        let mut errors = ErrorCollector::new();
        for token in tokenize_all(&source, &mut errors) {
            println!("{token:?}");
        }
    }

    if show_ast {
        let mut errors = ErrorCollector::new();
        let (program, _symbols, _types) = parse(&source, &mut errors);
        for diagnostic in errors.diagnostics() {
            eprintln!("{}", diagnostic.render(&source, !no_color));
        }
        print_ast(&program);
        if errors.had_error() {
            return ExitCode::from(255); // -1
        }
    }

    let mut stdio = StdIo;
    let tracker = NoLimitTracker::default();
    let (outcome, errors) = run_source(&source, &mut stdio, &mut stdio, &tracker);

    for diagnostic in errors.diagnostics() {
        if diagnostic.severity >= Severity::Warning {
            eprintln!("{}", diagnostic.render(&source, !no_color));
        }
    }

    match outcome {
        None => ExitCode::from(255), // -1: compilation error
        Some(Ok(RunOutcome::NoEntryPoint)) => {
            eprintln!("error: no 'main' function declared");
            ExitCode::from(255)
        }
        Some(Ok(RunOutcome::UncaughtException(payload))) => {
            eprintln!("[FATAL] uncaught exception: {payload}");
            ExitCode::from(254) // -2
        }
        Some(Ok(RunOutcome::Completed(value))) => match value {
            Value::Int { value, .. } => ExitCode::from(value as u8),
            _ => ExitCode::SUCCESS,
        },
        Some(Err(abort)) => {
            eprintln!("[FATAL] {abort}");
            ExitCode::from(254)
        }
    }
}

/// Dumps each top-level declaration with `{:#?}`; good enough for `-ast` to
/// sanity-check a parse without a dedicated pretty-printer.
fn print_ast(program: &Program) {
    for decl in program.top_level_declarations() {
        println!("{decl:#?}");
    }
}
