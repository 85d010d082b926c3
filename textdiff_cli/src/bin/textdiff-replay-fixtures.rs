use std::fs;
use std::path::Path;

use serde::Deserialize;
use textdiff_engine::{DiffBackend, DiffOptions, DiffResult, diff_texts};

#[derive(Debug, Deserialize)]
struct Fixture {
    name: String,
    original: String,
    modified: String,
    #[serde(default)]
    options: DiffOptions,
    expected: Vec<ExpectedRun>,
}

/// Expected outcome for one backend; hunks are `[o_start, o_end, m_start, m_end]`.
#[derive(Debug, Deserialize)]
struct ExpectedRun {
    backend: DiffBackend,
    #[serde(default)]
    quit_early: bool,
    hunks: Vec<[usize; 4]>,
}

fn hunk_ranges(result: &DiffResult) -> Vec<[usize; 4]> {
    result
        .changes
        .iter()
        .map(|c| {
            [
                c.original_range.start_line,
                c.original_range.end_line_exclusive,
                c.modified_range.start_line,
                c.modified_range.end_line_exclusive,
            ]
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let repo_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..");
    let fixtures_dir = repo_root.join("fixtures");

    let mut entries = fs::read_dir(&fixtures_dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|e| e.path());

    let mut checked = 0usize;
    for entry in entries {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }

        let raw = fs::read_to_string(&path)?;
        let fixture: Fixture = serde_json::from_str(&raw)?;

        for run in &fixture.expected {
            let result = diff_texts(
                &fixture.original,
                &fixture.modified,
                &fixture.options,
                run.backend,
            );

            if result.quit_early != run.quit_early {
                return Err(format!(
                    "fixture {} ({}): quit_early mismatch: expected {}, got {}",
                    fixture.name, run.backend, run.quit_early, result.quit_early
                )
                .into());
            }

            let hunks = hunk_ranges(&result);
            if hunks != run.hunks {
                return Err(format!(
                    "fixture {} ({}): hunks mismatch: expected {:?}, got {:?}",
                    fixture.name, run.backend, run.hunks, hunks
                )
                .into());
            }
        }

        checked += 1;
    }

    println!("replayed {checked} fixture(s)");
    Ok(())
}
