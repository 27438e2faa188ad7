use dupfind::duplicates::{DuplicateFinder, DuplicateGroup, FinderConfig, ScanSummary, Strategy};
use dupfind::output::{JsonOutput, TextOutput};
use std::fs;
use tempfile::{tempdir, TempDir};

fn scan_fixture() -> (TempDir, Vec<DuplicateGroup>, ScanSummary) {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), "hello").unwrap();
    fs::write(dir.path().join("b"), "hello").unwrap();
    fs::write(dir.path().join("c"), "world").unwrap();

    let finder = DuplicateFinder::new(FinderConfig::default().with_strategy(Strategy::FanOut));
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();
    (dir, groups, summary)
}

#[test]
fn test_text_report_for_scan() {
    let (dir, groups, summary) = scan_fixture();

    let mut buf = Vec::new();
    TextOutput::new(&groups, &summary).write_to(&mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();

    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines[0], "number of files: 2");
    assert_eq!(lines[1], "Files:");
    let mut members = vec![lines[2], lines[3]];
    members.sort_unstable();
    assert_eq!(
        members,
        vec![
            dir.path().join("a").to_str().unwrap(),
            dir.path().join("b").to_str().unwrap()
        ]
    );
    assert!(!text.contains(dir.path().join("c").to_str().unwrap()));
}

#[test]
fn test_json_report_for_scan() {
    let (_dir, groups, summary) = scan_fixture();

    let mut buf = Vec::new();
    JsonOutput::new(&groups, &summary).write_to(&mut buf).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();

    assert_eq!(json["duplicates"].as_array().unwrap().len(), 1);
    assert_eq!(json["duplicates"][0]["size"], 5);
    assert_eq!(json["duplicates"][0]["hash"], blake3::hash(b"hello").to_hex().as_str());
    assert_eq!(json["summary"]["strategy"], "fanout");
    assert_eq!(json["summary"]["files_hashed"], 3);
    assert_eq!(json["summary"]["bytes_discovered"], 15);
    assert_eq!(json["summary"]["reclaimable_space"], 5);
}
