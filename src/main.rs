use clap::{App, Arg};
use std::fs;
use std::io::{self, Write};
use tlox::session::{ExitCode, Session};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    let matches = App::new("tlox")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Tree-walking interpreter for Lox")
        .arg(
            Arg::with_name("script")
                .help("Script to run; starts a prompt when omitted")
                .index(1),
        )
        .arg(
            Arg::with_name("print-ast")
                .long("print-ast")
                .help("Print the parsed syntax tree instead of running it"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Log more (repeat for debug and trace output)"),
        )
        .get_matches();

    init_tracing(matches.occurrences_of("verbose"));

    let session = Session::new().print_ast(matches.is_present("print-ast"));
    let code = match matches.value_of("script") {
        Some(file) => run_file(session, file),
        None => run_prompt(session),
    };
    std::process::exit(code.into());
}

// RUST_LOG wins over -v when both are given.
fn init_tracing(verbosity: u64) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn run_file(mut session: Session, file: &str) -> ExitCode {
    let contents = match fs::read_to_string(file) {
        Ok(contents) => contents,
        Err(err) => {
            eprintln!("Could not read '{}': {}", file, err);
            return ExitCode::IoError;
        }
    };
    match session.run(&contents) {
        Ok(()) => ExitCode::Success,
        Err(err) => {
            eprintln!("{}", err);
            err.exit_code()
        }
    }
}

fn run_prompt(mut session: Session) -> ExitCode {
    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            return ExitCode::IoError;
        }
        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => return ExitCode::Success,
            Ok(_) => {
                if let Err(err) = session.run(&line) {
                    eprintln!("{}", err);
                }
            }
            Err(err) => {
                eprintln!("Failed to read line: {}", err);
                return ExitCode::IoError;
            }
        }
    }
}
