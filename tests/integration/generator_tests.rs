use dupfind::duplicates::{DuplicateFinder, FinderConfig, Strategy};
use dupfind::generator::{generate, LetterStream};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_generated_tree_is_scannable() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("test");

    // 200 files of 1 letter: at most 52 distinct bodies, so duplicates are certain.
    let report = generate(&target, 200, 1, &mut LetterStream::new(99)).unwrap();
    assert_eq!(report.created, 200);

    let finder = DuplicateFinder::new(FinderConfig::default().with_strategy(Strategy::FanOut));
    let (groups, summary) = finder.find_duplicates(&target).unwrap();

    assert_eq!(summary.files_hashed, 200);
    assert!(!groups.is_empty());
    assert!(groups.len() <= 52);
    for group in &groups {
        let first = fs::read(&group.paths[0]).unwrap();
        for path in &group.paths[1..] {
            assert_eq!(fs::read(path).unwrap(), first);
        }
    }
}

#[test]
fn test_seeded_generation_is_reproducible() {
    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    generate(a.path(), 10, 8, &mut LetterStream::new(5)).unwrap();
    generate(b.path(), 10, 8, &mut LetterStream::new(5)).unwrap();

    for i in 0..10 {
        let name = format!("file_{i}");
        assert_eq!(
            fs::read(a.path().join(&name)).unwrap(),
            fs::read(b.path().join(&name)).unwrap()
        );
    }
}

#[test]
fn test_generate_overwrites_existing_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("file_0"), "a much longer previous body").unwrap();

    generate(dir.path(), 1, 4, &mut LetterStream::new(1)).unwrap();
    assert_eq!(fs::read(dir.path().join("file_0")).unwrap().len(), 4);
}
