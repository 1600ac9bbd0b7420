use clap::{Parser, Subcommand};
use duel_compiler::parser::Parser as _;
use duel_compiler::{CompileError, DuelParser, HtmlConfig, LinkCollector, tokenize};
use serde::Serialize;
use std::error::Error;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "duel")]
#[command(about = "DUEL - parse and check .duel view templates")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse .duel files and report errors
    Check {
        /// Path to .duel file or directory
        path: PathBuf,

        /// JSON file overriding the HTML tables
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the cause chain of each error
        #[arg(long, short)]
        verbose: bool,
    },
    /// Dump the views (or tokens) of one document
    Parse {
        /// Path to .duel file
        #[arg(required_unless_present = "stdin")]
        file: Option<PathBuf>,

        /// Read from stdin
        #[arg(long)]
        stdin: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Dump the token stream instead of the tree
        #[arg(long, conflicts_with = "links")]
        tokens: bool,

        /// List URL-bearing attributes
        #[arg(long)]
        links: bool,

        /// JSON file overriding the HTML tables
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { path, config, verbose } => {
            let config = load_config(config.as_deref());
            check_path(&path, &config, verbose);
        }
        Commands::Parse { file, stdin, json, tokens, links, config } => {
            let config = load_config(config.as_deref());
            let (source, filename) = if stdin {
                let mut source = String::new();
                if let Err(err) = io::stdin().read_to_string(&mut source) {
                    fail(&format!("Error: failed to read stdin: {}", err));
                }
                (source, "<stdin>".to_string())
            } else if let Some(path) = file {
                match fs::read_to_string(&path) {
                    Ok(source) => (source, path.display().to_string()),
                    Err(err) => fail(&format!("Error: failed to read {}: {}", path.display(), err)),
                }
            } else {
                fail("Error: provide a file or use --stdin");
            };

            let mode = if tokens {
                Dump::Tokens
            } else if links {
                Dump::Links
            } else {
                Dump::Views
            };
            parse_source(&source, &filename, &config, mode, json);
        }
    }
}

fn load_config(path: Option<&Path>) -> HtmlConfig {
    let Some(path) = path else {
        return HtmlConfig::standard();
    };

    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(err) => fail(&format!("Error: failed to read {}: {}", path.display(), err)),
    };
    match HtmlConfig::from_json(&json) {
        Ok(config) => config,
        Err(err) => fail(&format!("Error: invalid config {}: {}", path.display(), err)),
    }
}

fn check_path(path: &Path, config: &HtmlConfig, verbose: bool) {
    let files: Vec<PathBuf> = if path.is_file() {
        if path.extension().is_none_or(|ext| ext != "duel") {
            fail(&format!("Error: {} is not a .duel file", path.display()));
        }
        vec![path.to_path_buf()]
    } else if path.is_dir() {
        let mut files: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "duel"))
            .map(|e| e.into_path())
            .collect();
        files.sort();
        files
    } else {
        fail(&format!("Error: {} does not exist", path.display()));
    };

    if files.is_empty() {
        fail(&format!("No .duel files found in {}", path.display()));
    }

    let start = Instant::now();
    let failed = files.iter().filter(|file| !check_file(file, config, verbose)).count();
    print_summary(files.len(), failed, start.elapsed());

    if failed > 0 {
        std::process::exit(1);
    }
}

fn check_file(path: &Path, config: &HtmlConfig, verbose: bool) -> bool {
    let filename = path.display().to_string();
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            report_failure(&filename, &CompileError::Io(err), "", verbose);
            return false;
        }
    };

    match compile(&source, config) {
        Ok(views) => {
            print_checked(&filename, views);
            true
        }
        Err(err) => {
            report_failure(&filename, &err, &source, verbose);
            false
        }
    }
}

/// Parse and require at least one view
fn compile(source: &str, config: &HtmlConfig) -> Result<usize, CompileError> {
    let ast = DuelParser::new(config).parse(source)?;
    if ast.views.is_empty() {
        return Err(CompileError::NoViews);
    }
    Ok(ast.views.len())
}

#[derive(Clone, Copy)]
enum Dump {
    Views,
    Tokens,
    Links,
}

fn parse_source(source: &str, filename: &str, config: &HtmlConfig, mode: Dump, json: bool) {
    if let Dump::Tokens = mode {
        let tokens = tokenize(source, config);
        if json {
            print_json(&tokens);
        } else {
            for token in &tokens {
                println!("{:>8}  {}", token.position().to_string(), token);
            }
        }
        return;
    }

    let ast = match DuelParser::new(config).parse(source) {
        Ok(ast) => ast,
        Err(err) => {
            report_failure(filename, &CompileError::Parse(err), source, false);
            std::process::exit(1);
        }
    };

    match mode {
        Dump::Links => {
            let links = LinkCollector::collect(&ast, config);
            if json {
                print_json(&links);
            } else {
                for link in &links {
                    let at = link.position.map(|p| p.to_string()).unwrap_or_default();
                    println!("{:>8}  {}  <{} {}=\"{}\">", at, link.view, link.tag, link.attribute, link.value);
                }
            }
        }
        _ if json => print_json(&ast),
        _ => {
            for view in ast.views() {
                println!("{}", view);
            }
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(err) => fail(&format!("Error: failed to serialize output: {}", err)),
    }
}

fn report_failure(filename: &str, err: &CompileError, source: &str, verbose: bool) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("  \x1b[31m✗\x1b[0m {}", filename);
        eprint!("{}", err.render_color(source, filename));
    } else {
        eprintln!("  ✗ {}", filename);
        eprint!("{}", err.render(source, filename));
    }

    if verbose {
        let mut cause = err.source().and_then(|inner| inner.source());
        while let Some(err) = cause {
            eprintln!("    caused by: {}", err);
            cause = err.source();
        }
    }
}

fn print_checked(filename: &str, views: usize) {
    let is_tty = io::stderr().is_terminal();
    let views_word = if views == 1 { "view" } else { "views" };
    if is_tty {
        eprintln!("  \x1b[32m✓\x1b[0m {} \x1b[2m({} {})\x1b[0m", filename, views, views_word);
    } else {
        eprintln!("  ✓ {} ({} {})", filename, views, views_word);
    }
}

fn print_summary(count: usize, failed: usize, elapsed: Duration) {
    let is_tty = io::stderr().is_terminal();
    let time_str = format_duration(elapsed);
    let files_word = if count == 1 { "file" } else { "files" };

    let line = if failed == 0 {
        format!("✨ Checked {} {} in {}", count, files_word, time_str)
    } else {
        format!("{} of {} {} failed in {}", failed, count, files_word, time_str)
    };

    if is_tty {
        eprintln!("\n\x1b[1m{}\x1b[0m", line);
    } else {
        eprintln!("\n{}", line);
    }
}

fn format_duration(d: Duration) -> String {
    let micros = d.as_micros();
    if micros < 1000 {
        format!("{}μs", micros)
    } else if micros < 1_000_000 {
        format!("{:.1}ms", micros as f64 / 1000.0)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}
