//! Golden-file harness over the documents in test/set/.
//!
//! Every `test/set/*.set` document is read with a small fixed schema (set
//! info, cards) and dumped to a canonical text form, which must match the
//! corresponding `test/expect/*.txt` file exactly, accumulated warnings
//! included.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use glob::glob;
use libmse::{Reader, Result, Version};

/// Version the harness claims to run, far ahead of every fixture.
const APP_VERSION: Version = Version::new(2000000);

/// Root test directory, shared with the rest of the workspace.
fn test_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("test")
}

#[derive(Default)]
struct Summary {
    game: String,
    title: String,
    author: String,
    description: String,
    cards: Vec<String>,
}

fn read_summary<R: BufRead>(reader: &mut Reader<R>) -> Result<Summary> {
    let mut summary = Summary::default();
    while reader.more()? {
        if reader.enter_block("game")? {
            reader.handle_string(&mut summary.game)?;
            reader.exit_block()?;
        } else if reader.enter_block("set info")? {
            while reader.more()? {
                if reader.enter_block("title")? {
                    reader.handle_string(&mut summary.title)?;
                    reader.exit_block()?;
                } else if reader.enter_block("author")? {
                    reader.handle_string(&mut summary.author)?;
                    reader.exit_block()?;
                } else if reader.enter_block("description")? {
                    reader.handle_string(&mut summary.description)?;
                    reader.exit_block()?;
                } else {
                    reader.unknown_key()?;
                }
            }
            reader.exit_block()?;
        } else if reader.enter_block("card")? {
            let mut name = String::new();
            while reader.more()? {
                if reader.enter_block("name")? {
                    reader.handle_string(&mut name)?;
                    reader.exit_block()?;
                } else {
                    reader.unknown_key()?;
                }
            }
            reader.exit_block()?;
            summary.cards.push(name);
        } else {
            reader.unknown_key()?;
        }
    }
    Ok(summary)
}

fn dump(path: &Path) -> String {
    let file = fs::File::open(path).unwrap();
    let name = path.file_name().unwrap().to_string_lossy();
    let mut reader = Reader::new(BufReader::new(file), &name, APP_VERSION, false).unwrap();
    let summary = read_summary(&mut reader).unwrap();

    let mut out = format!("version: {}\n", reader.file_version().as_u32());
    for (label, value) in [
        ("game", &summary.game),
        ("title", &summary.title),
        ("author", &summary.author),
        ("description", &summary.description),
    ] {
        if !value.is_empty() {
            out.push_str(&format!("{label}: {}\n", value.replace('\n', "\\n")));
        }
    }
    for card in &summary.cards {
        out.push_str(&format!("card: {card}\n"));
    }
    for warning in reader.take_warnings() {
        out.push_str(&format!("warning: {warning}\n"));
    }
    out
}

#[test]
fn fixtures_match_expected_dumps() {
    let pattern = test_root().join("set").join("*.set");
    let mut count = 0;
    for entry in glob(pattern.to_str().unwrap()).unwrap() {
        let path = entry.unwrap();
        let stem = path.file_stem().unwrap().to_string_lossy();
        let expect_path = test_root().join("expect").join(format!("{stem}.txt"));
        let expected = fs::read_to_string(&expect_path)
            .unwrap_or_else(|_| panic!("missing expectation for {}", path.display()));
        let actual = dump(&path);
        assert_eq!(actual, expected, "fixture {}", path.display());
        count += 1;
    }
    assert!(count > 0, "no fixtures found under {}", pattern.display());
}
