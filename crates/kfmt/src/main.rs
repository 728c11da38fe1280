//! The Kotlin formatter CLI.
//!
//! `kfmt <paths>` formats files in place; directories are searched
//! recursively for `.kt`/`.kts` sources.
//!
//! Options:
//! - `--max-line-length` - Column limit (default 100)
//! - `--indent` - Indent step for block contents (default 4)
//! - `--continuation-indent` - Indent for wrapped statements (default 8)
//! - `--stdin` - Read from stdin, write the result to stdout
//! - `--check` - Write nothing; exit 1 if any file would change
//!
//! Exit codes: 0 on success, 1 when `--check` found differences, 2 on an
//! unrecoverable error (bad flags, I/O on every input, or every file
//! failing to parse).

mod discovery;

use std::io::Read;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use kfmt_core::{FormatError, Formatter};

#[derive(Parser)]
#[command(name = "kfmt", version, about = "Formats Kotlin source code")]
struct Cli {
    /// Files to format; directories are searched recursively.
    paths: Vec<PathBuf>,

    /// Maximum line length in columns
    #[arg(long = "max-line-length", default_value_t = 100)]
    max_line_length: usize,

    /// Indent step for block contents
    #[arg(long, default_value_t = 4)]
    indent: usize,

    /// Indent for continuation lines of wrapped statements
    #[arg(long = "continuation-indent", default_value_t = 8)]
    continuation_indent: usize,

    /// Read source from stdin and write the result to stdout
    #[arg(long)]
    stdin: bool,

    /// Write nothing; exit 1 if any file would be changed
    #[arg(long)]
    check: bool,
}

fn main() {
    let cli = Cli::parse();
    process::exit(run(&cli));
}

fn run(cli: &Cli) -> i32 {
    if cli.max_line_length == 0 {
        eprintln!("kfmt: configuration error: --max-line-length must be positive");
        return 2;
    }
    if !cli.stdin && cli.paths.is_empty() {
        eprintln!("kfmt: configuration error: no input files (or use --stdin)");
        return 2;
    }

    let formatter = Formatter {
        max_line_length: cli.max_line_length,
        standard_indent: cli.indent,
        continuation_indent: cli.continuation_indent,
    };

    if cli.stdin {
        return run_stdin(&formatter, cli.check);
    }

    let mut files: Vec<PathBuf> = Vec::new();
    for path in &cli.paths {
        if path.is_dir() {
            match discovery::discover_kotlin_files(path) {
                Ok(found) => files.extend(found),
                Err(message) => {
                    eprintln!("{}:1: io error: {}", path.display(), message);
                    return 2;
                }
            }
        } else {
            files.push(path.clone());
        }
    }

    let mut failures = 0usize;
    let mut would_change = false;
    for file in &files {
        match process_file(&formatter, file, cli.check) {
            Ok(changed) => would_change |= changed,
            Err(()) => failures += 1,
        }
    }

    if !files.is_empty() && failures == files.len() {
        2
    } else if cli.check && would_change {
        1
    } else {
        0
    }
}

/// Format stdin to stdout. In check mode nothing is written; the exit code
/// alone reports whether the input was formatted.
fn run_stdin(formatter: &Formatter, check: bool) -> i32 {
    let mut source = String::new();
    if let Err(err) = std::io::stdin().read_to_string(&mut source) {
        eprintln!("<stdin>:1: io error: {err}");
        return 2;
    }
    match formatter.format(&source) {
        Ok(formatted) => {
            if check {
                if formatted == source {
                    0
                } else {
                    1
                }
            } else {
                print!("{formatted}");
                0
            }
        }
        Err(err) => {
            report_error("<stdin>", &source, &err);
            2
        }
    }
}

/// Format one file. Returns whether the file differs from its formatted
/// form; `Err` means the file could not be processed (and was reported).
fn process_file(formatter: &Formatter, path: &std::path::Path, check: bool) -> Result<bool, ()> {
    let display = path.display().to_string();
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{display}:1: io error: {err}");
            return Err(());
        }
    };

    match formatter.format(&source) {
        Ok(formatted) => {
            let changed = formatted != source;
            if changed && !check {
                if let Err(err) = write_in_place(path, &formatted) {
                    eprintln!("{display}:1: io error: {err}");
                    return Err(());
                }
            }
            if changed && check {
                println!("{display}");
            }
            Ok(changed)
        }
        Err(err) => {
            report_error(&display, &source, &err);
            Err(())
        }
    }
}

/// One machine-readable line, then a source snippet for parse errors.
fn report_error(file: &str, source: &str, err: &FormatError) {
    eprintln!("{file}:{}: {}: {}", err.line(), err.kind(), err.message());

    if matches!(err, FormatError::Parse { .. }) {
        use ariadne::{Label, Report, ReportKind, Source};
        // Clamp to the source so errors at end-of-file still render.
        let len = source.len();
        let start = (err.offset() as usize).min(len.saturating_sub(1));
        let end = (start + 1).min(len);
        let _ = Report::<std::ops::Range<usize>>::build(ReportKind::Error, start..end)
            .with_message(err.kind())
            .with_label(Label::new(start..end).with_message(err.message()))
            .finish()
            .eprint(Source::from(source));
    }
}

/// Replace a file through a sibling temp file and rename.
fn write_in_place(path: &std::path::Path, content: &str) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".kfmt-tmp");
    let tmp_path = PathBuf::from(tmp);
    std::fs::write(&tmp_path, content)?;
    match std::fs::rename(&tmp_path, path) {
        Ok(()) => Ok(()),
        Err(err) => {
            let _ = std::fs::remove_file(&tmp_path);
            Err(err)
        }
    }
}
