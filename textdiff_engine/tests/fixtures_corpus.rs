use std::fs;
use std::path::Path;

use serde_json::Value;
use textdiff_engine::{DiffBackend, DiffOptions, diff_texts};

fn hunk_ranges(value: &Value) -> Vec<[usize; 4]> {
    serde_json::from_value(value.clone()).expect("hunks are [o_start, o_end, m_start, m_end]")
}

#[test]
fn fixtures_match_expected_hunks() {
    let repo_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..");
    let fixtures_dir = repo_root.join("fixtures");

    let mut paths: Vec<_> = fs::read_dir(&fixtures_dir)
        .expect("read fixtures")
        .map(|entry| entry.expect("entry").path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
        .collect();
    paths.sort();
    assert!(!paths.is_empty(), "no fixtures in {}", fixtures_dir.display());

    for path in paths {
        let raw = fs::read_to_string(&path).expect("read fixture");
        let fixture: Value = serde_json::from_str(&raw).expect("fixture json");
        let name = fixture["name"].as_str().expect("fixture name");
        let original = fixture["original"].as_str().expect("original text");
        let modified = fixture["modified"].as_str().expect("modified text");
        let options: DiffOptions = match fixture.get("options") {
            Some(value) => serde_json::from_value(value.clone()).expect("fixture options"),
            None => DiffOptions::default(),
        };

        for run in fixture["expected"].as_array().expect("expected runs") {
            let backend: DiffBackend =
                serde_json::from_value(run["backend"].clone()).expect("backend name");
            let result = diff_texts(original, modified, &options, backend);

            assert_eq!(
                result.quit_early,
                run["quit_early"].as_bool().unwrap_or(false),
                "fixture {name} ({backend}): quit_early"
            );
            let actual: Vec<[usize; 4]> = result
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
                .collect();
            assert_eq!(
                actual,
                hunk_ranges(&run["hunks"]),
                "fixture {name} ({backend}): hunks"
            );
        }
    }
}
