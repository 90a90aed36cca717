//! Shared helpers for integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

/// A `.swift` input paired with its `.expected` output.
#[derive(Debug)]
pub struct Fixture {
    pub name: String,
    pub input_path: PathBuf,
    pub input: String,
    pub expected: String,
}

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// Every fixture under `tests/fixtures`, sorted by path.
pub fn load_fixtures() -> Vec<Fixture> {
    let mut fixtures: Vec<Fixture> = WalkDir::new(fixtures_dir())
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "swift"))
        .map(|entry| {
            let input_path = entry.path().to_path_buf();
            let expected_path = input_path.with_extension("expected");
            Fixture {
                name: input_path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                input: fs::read_to_string(&input_path).expect("fixture input"),
                expected: fs::read_to_string(&expected_path).unwrap_or_else(|_| {
                    panic!("missing {}", expected_path.display())
                }),
                input_path,
            }
        })
        .collect();
    fixtures.sort_by(|a, b| a.input_path.cmp(&b.input_path));
    fixtures
}

static FRESH_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"__macro_local_\d+([A-Za-z_]+?)[0-9a-f]{6}_").unwrap());

/// Replaces generated temporaries with `__fresh_<hint>` so expectations do
/// not depend on hash output.
pub fn normalize_fresh_names(text: &str) -> String {
    FRESH_NAME.replace_all(text, "__fresh_${1}").into_owned()
}
