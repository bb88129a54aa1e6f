//!
//! tabularium CLI binary
//! ---------------------
//! Command-line shell for a tabularium session: run a SQL script from a
//! file, a one-shot query from an argument or stdin, or an interactive
//! interpreter. All statements run against an in-memory engine owned by the
//! session for the lifetime of the process.

use std::env;
use std::io::Read;

use anyhow::Result;
use rustyline::error::ReadlineError;

use tabularium::cli::{print_response, response_json};
use tabularium::response::ParserResponse;
use tabularium::session::Session;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} --query \"<SQL>\" [--json]\n  {program} -q \"<SQL>\" [--json]\n  {program} --file <script.sql> [--json]\n  {program} [--json]            # reads SQL from stdin\n  {program} --repl [--json]     # start interactive interpreter\n\nFlags:\n  -q, --query <SQL>        Run a one-shot statement or ;-separated script\n  --file <path>            Run a SQL script from a file\n  --json                   Print responses as JSON instead of ASCII tables\n  --repl                   Start interactive mode\n  -h, --help               Show this help\n\nInteractive commands:\n  help                     show this help\n  tables                   list tables\n  quit | exit              exit the interpreter\n  <SQL>                    run a statement\n\nExamples:\n  {program} -q \"CREATE TABLE t (id INT PRIMARY KEY, name VARCHAR(32)); INSERT INTO t VALUES (1, 'ana'); SELECT * FROM t\"\n  {program} --file demo.sql --json"
    );
}

fn output(resp: &ParserResponse, json: bool) {
    if json {
        println!("{}", response_json(resp));
    } else {
        print_response(resp);
    }
}

fn run_repl(session: &mut Session, json: bool) -> Result<()> {
    let mut rl = rustyline::DefaultEditor::new()?;
    loop {
        match rl.readline("tsql> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);
                match line.to_lowercase().as_str() {
                    "quit" | "exit" => break,
                    "help" => {
                        print_usage("tsql");
                        continue;
                    }
                    "tables" => {
                        println!("{}", session.engine().get_table_names().join("\n"));
                        continue;
                    }
                    _ => {}
                }
                session.parse_str(line);
                output(session.response(), json);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("readline error: {}", e);
                break;
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize tracing so engine diagnostics are visible on the command line
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);

    let mut query: Option<String> = None;
    let mut file: Option<String> = None;
    let mut json = false;
    let mut repl = false;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "-q" | "--query" => {
                i += 1;
                if i >= args.len() {
                    print_usage(&program);
                    std::process::exit(2);
                }
                query = Some(args[i].clone());
            }
            "--file" => {
                i += 1;
                if i >= args.len() {
                    print_usage(&program);
                    std::process::exit(2);
                }
                file = Some(args[i].clone());
            }
            "--json" => json = true,
            "--repl" => repl = true,
            "-h" | "--help" => {
                print_usage(&program);
                return Ok(());
            }
            other => {
                eprintln!("unknown flag: {}", other);
                print_usage(&program);
                std::process::exit(2);
            }
        }
        i += 1;
    }

    let mut session = Session::in_memory();

    if repl {
        return run_repl(&mut session, json);
    }

    if let Some(path) = file {
        match session.parse_path(&path) {
            Ok(resp) => output(resp, json),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let text = match query {
        Some(q) => q,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    session.parse_str(&text);
    output(session.response(), json);
    if session.response().failed() {
        std::process::exit(1);
    }
    Ok(())
}
