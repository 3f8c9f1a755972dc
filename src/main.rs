use anyhow::Context;
use clap::Parser;
use jsname::interpreter::NameRecord;
use jsname::{RunOptions, run_source};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "jsname", version, about = "Runs JavaScript and reports inferred function names")]
struct Cli {
    /// JavaScript file to execute
    file: Option<PathBuf>,

    /// Evaluate inline JavaScript
    #[arg(short = 'e', long = "eval")]
    eval: Option<String>,

    /// Print every nameable value created, with the name it received
    #[arg(long)]
    names: bool,

    /// Print the name records as JSON lines (implies --names)
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn options(&self) -> RunOptions {
        RunOptions {
            record_names: self.names || self.json,
        }
    }
}

fn report_names(names: &[NameRecord], json: bool) {
    for record in names {
        if json {
            match serde_json::to_string(record) {
                Ok(line) => println!("{line}"),
                Err(e) => eprintln!("Failed to serialize name record: {e}"),
            }
        } else {
            let name = record.name.as_deref().unwrap_or("<own name>");
            println!("{}\t{:?}\t{}", record.kind, name, record.source_text);
        }
    }
}

fn execute_code(cli: &Cli, code: &str) -> ExitCode {
    match run_source(code, &cli.options()) {
        Ok(output) => {
            report_names(&output.names, cli.json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(1)
        }
    }
}

fn read_script(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Error reading {}", path.display()))
}

fn run_file(cli: &Cli, path: &Path) -> ExitCode {
    match read_script(path) {
        Ok(source) => execute_code(cli, &source),
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn run_repl(cli: &Cli) -> ExitCode {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    println!("jsname v{}", env!("CARGO_PKG_VERSION"));
    println!("Type JavaScript statements. Press Ctrl-D to exit.");

    let mut status = ExitCode::SUCCESS;

    loop {
        print!("> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        let read_result = stdin.lock().read_line(&mut line);

        match read_result {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    // Each line runs in a fresh realm. The session exits with
                    // the status of the last line it ran.
                    status = execute_code(cli, trimmed);
                }
            }
            Err(e) => {
                eprintln!("Read error: {e}");
                return ExitCode::from(1);
            }
        }
    }

    println!();
    status
}

fn main() -> ExitCode {
    jsname::logging::init_tracing();
    let cli = Cli::parse();

    if let Some(code) = &cli.eval {
        return execute_code(&cli, code);
    }

    if let Some(path) = &cli.file {
        return run_file(&cli, path);
    }

    run_repl(&cli)
}
