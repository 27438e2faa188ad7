use dupfind::duplicates::{DuplicateFinder, FinderConfig, Strategy};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_only_empty_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("empty1.txt"), "").unwrap();
    fs::write(dir.path().join("empty2.txt"), "").unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.files_discovered, 0);
    assert_eq!(summary.peak_io, 1); // the root listing
}

#[test]
fn test_empty_subdirectories_only() {
    let dir = tempdir().unwrap();
    for name in ["a", "b", "a/c", "a/c/d"] {
        fs::create_dir_all(dir.path().join(name)).unwrap();
    }

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.directories, 5);
    // root + 4 directories, no files
    assert_eq!(summary.tasks_spawned, 5);
}

#[test]
fn test_special_characters_in_filenames() {
    let dir = tempdir().unwrap();
    let pairs = [
        ("file with spaces.txt", "duplicate1.txt", "content"),
        ("café_🦀.txt", "duplicate2.txt", "unicode content"),
        ("special_!@#$%^&()_+.txt", "duplicate3.txt", "special content"),
    ];
    for (odd, plain, body) in pairs {
        fs::write(dir.path().join(odd), body).unwrap();
        fs::write(dir.path().join(plain), body).unwrap();
    }

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 3);
    for (odd, _, _) in pairs {
        assert!(groups.iter().any(|g| g.paths.contains(&dir.path().join(odd))));
    }
}

#[test]
fn test_deeply_nested_paths() {
    let dir = tempdir().unwrap();
    let mut current_path = dir.path().to_path_buf();
    for i in 0..40 {
        current_path = current_path.join(format!("level_{i}"));
    }
    fs::create_dir_all(&current_path).unwrap();
    fs::write(current_path.join("deep.txt"), "deep content").unwrap();
    fs::write(dir.path().join("shallow.txt"), "deep content").unwrap();

    for strategy in [
        Strategy::Sequential,
        Strategy::Pipeline,
        Strategy::MultiWalker,
        Strategy::FanOut,
    ] {
        let finder = DuplicateFinder::new(
            FinderConfig::default()
                .with_strategy(strategy)
                .with_io_limit(1)
                .with_threads(1)
                .with_workers(1),
        );
        let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

        assert_eq!(groups.len(), 1, "{strategy}");
        assert_eq!(summary.files_hashed, 2);
        assert_eq!(summary.directories, 41);
    }
}

#[test]
fn test_wide_directory() {
    let dir = tempdir().unwrap();
    for i in 0..1000 {
        fs::write(dir.path().join(format!("f{i:04}")), format!("{}", i % 10)).unwrap();
    }

    let finder = DuplicateFinder::new(FinderConfig::default().with_io_limit(3));
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 10);
    assert!(groups.iter().all(|g| g.len() == 100));
    assert_eq!(summary.duplicate_files, 990);
    assert!(summary.peak_io <= 3);
}

#[test]
fn test_same_content_different_sizes_never_grouped() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), "abc").unwrap();
    fs::write(dir.path().join("b"), "abcd").unwrap();
    fs::write(dir.path().join("c"), "abc\n").unwrap();

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert!(groups.is_empty());
}
