//! Test runner that compares parsed views against .expected and .expected.err files
//!
//! Run with: cargo test --test fixture_tests

use duel_compiler::{HtmlConfig, parse};
use libtest_mimic::{Arguments, Failed, Trial};
use std::fs;
use std::path::{Path, PathBuf};

/// Collect all .duel fixtures
fn collect_fixtures() -> Vec<PathBuf> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let pattern = format!("{}/**/*.duel", root.display());

    let mut files: Vec<PathBuf> = glob::glob(&pattern)
        .map(|paths| paths.filter_map(Result::ok).collect())
        .unwrap_or_default();
    files.sort();
    files
}

/// e.g. "tests/fixtures/control/call.duel" -> "control/call"
fn trial_name(path: &Path) -> String {
    let parent = path.parent().and_then(|p| p.file_name()).unwrap_or_default();
    let stem = path.file_stem().unwrap_or_default();
    format!("{}/{}", parent.to_string_lossy(), stem.to_string_lossy())
}

fn is_error_fixture(path: &Path) -> bool {
    path.parent()
        .and_then(|p| p.file_name())
        .is_some_and(|name| name == "errors")
}

fn read(path: &Path) -> Result<String, Failed> {
    fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e).into())
}

/// Each view rendered on its own line
fn check_output(path: &Path) -> Result<(), Failed> {
    let source = read(path)?;
    let expected = read(&path.with_extension("expected"))?;

    let ast = parse(&source, &HtmlConfig::standard())
        .map_err(|err| err.render(&source, &path.display().to_string()))?;
    let actual: Vec<String> = ast.views().map(|view| view.to_string()).collect();
    let actual = actual.join("\n");

    if actual.trim() != expected.trim() {
        return Err(format!(
            "Output mismatch\n--- expected ---\n{}\n--- actual ---\n{}",
            expected.trim(),
            actual.trim()
        )
        .into());
    }
    Ok(())
}

/// The parse must fail with exactly the expected message
fn check_error(path: &Path) -> Result<(), Failed> {
    let source = read(path)?;
    let expected = read(&path.with_extension("expected.err"))?;

    match parse(&source, &HtmlConfig::standard()) {
        Ok(ast) => Err(format!("expected an error, got {} view(s)", ast.views.len()).into()),
        Err(err) if err.message == expected.trim() => Ok(()),
        Err(err) => Err(format!(
            "Error mismatch\n--- expected ---\n{}\n--- actual ---\n{}",
            expected.trim(),
            err.message
        )
        .into()),
    }
}

fn main() {
    let args = Arguments::from_args();

    let trials = collect_fixtures()
        .into_iter()
        .map(|path| {
            let name = trial_name(&path);
            if is_error_fixture(&path) {
                Trial::test(name, move || check_error(&path))
            } else {
                Trial::test(name, move || check_output(&path))
            }
        })
        .collect();

    libtest_mimic::run(&args, trials).exit();
}
