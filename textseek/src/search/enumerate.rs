use ignore::WalkBuilder;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::matcher::{matches_file_name, PatternSet};
use crate::errors::{unify_path, SearchError, SearchResult};

/// Expands glob patterns against a directory into a deduplicated list of
/// existing regular files.
///
/// Candidates come back in pattern-major order: every file selected by the
/// first pattern, then files the second pattern adds, and so on. Overlapping
/// patterns never emit the same file twice; deduplication is keyed on the
/// canonicalized path, so two spellings of one file collapse.
///
/// A directory that does not exist yields an empty list, not an error. Only
/// a directory that exists but cannot be listed fails, since no candidate
/// list can be produced at all.
pub fn enumerate(
    directory: &Path,
    patterns: &PatternSet,
    recursive: bool,
) -> SearchResult<Vec<PathBuf>> {
    if !directory.is_dir() {
        debug!(
            "Directory {} does not exist, no candidates",
            directory.display()
        );
        return Ok(Vec::new());
    }
    if let Err(e) = fs::read_dir(directory) {
        return Err(SearchError::enumeration_failed(directory, e));
    }

    let mut walker = WalkBuilder::new(directory);
    walker
        .hidden(false)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false);
    if !recursive {
        // Depth 1 keeps the walk to direct children of the directory
        walker.max_depth(Some(1));
    }

    let entries: Vec<PathBuf> = walker
        .build()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .collect();

    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut candidates = Vec::new();

    for pattern in patterns.iter() {
        for path in &entries {
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => continue,
            };
            if !matches_file_name(pattern, name) {
                continue;
            }
            let unified = unify_path(path);
            if seen.contains(&unified) {
                continue;
            }
            // Drops directories, dangling symlinks, and files that vanished
            // between the walk and this check
            if !path.is_file() {
                continue;
            }
            seen.insert(unified);
            candidates.push(path.clone());
        }
    }

    debug!(
        "Enumerated {} candidate files under {}",
        candidates.len(),
        directory.display()
    );
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(patterns: &[&str]) -> PatternSet {
        let owned: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        PatternSet::compile(&owned).unwrap()
    }

    fn names(candidates: &[PathBuf]) -> Vec<String> {
        candidates
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_non_recursive_matches_direct_children_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "one").unwrap();
        fs::write(dir.path().join("b.log"), "two").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/c.txt"), "three").unwrap();

        let candidates = enumerate(dir.path(), &compile(&["*.txt"]), false).unwrap();
        assert_eq!(names(&candidates), vec!["a.txt"]);
    }

    #[test]
    fn test_recursive_is_a_superset() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "one").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/c.txt"), "three").unwrap();

        let patterns = compile(&["*.txt"]);
        let flat = enumerate(dir.path(), &patterns, false).unwrap();
        let deep = enumerate(dir.path(), &patterns, true).unwrap();

        assert_eq!(flat.len(), 1);
        assert_eq!(deep.len(), 2);
        for path in &flat {
            assert!(deep.contains(path));
        }
    }

    #[test]
    fn test_overlapping_patterns_never_double_count() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "one").unwrap();

        let candidates =
            enumerate(dir.path(), &compile(&["*.txt", "*.txt", "a.*"]), false).unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_pattern_major_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x.log"), "one").unwrap();
        fs::write(dir.path().join("y.txt"), "two").unwrap();

        let candidates = enumerate(dir.path(), &compile(&["*.txt", "*.log"]), false).unwrap();
        assert_eq!(names(&candidates), vec!["y.txt", "x.log"]);
    }

    #[test]
    fn test_enumeration_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "one").unwrap();
        fs::write(dir.path().join("b.txt"), "two").unwrap();

        let patterns = compile(&["*.txt"]);
        let first = enumerate(dir.path(), &patterns, false).unwrap();
        let second = enumerate(dir.path(), &patterns, false).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_directory_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("nope");
        let candidates = enumerate(&gone, &compile(&["*"]), false).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_file_as_directory_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, "not a directory").unwrap();
        let candidates = enumerate(&file, &compile(&["*"]), false).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_directories_are_not_candidates() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("notes.txt")).unwrap();
        fs::write(dir.path().join("real.txt"), "content").unwrap();

        let candidates = enumerate(dir.path(), &compile(&["*.txt"]), false).unwrap();
        assert_eq!(names(&candidates), vec!["real.txt"]);
    }

    #[test]
    fn test_hidden_files_need_explicit_pattern() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".secret"), "shh").unwrap();
        fs::write(dir.path().join("open.txt"), "hi").unwrap();

        let star = enumerate(dir.path(), &compile(&["*"]), false).unwrap();
        assert_eq!(names(&star), vec!["open.txt"]);

        let dotted = enumerate(dir.path(), &compile(&[".*"]), false).unwrap();
        assert_eq!(names(&dotted), vec![".secret"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_unlistable_directory_fails() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("a.txt"), "hello").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores permission bits; only assert when the lock took effect
        if fs::read_dir(&locked).is_err() {
            let err = enumerate(&locked, &compile(&["*"]), false).unwrap_err();
            assert!(matches!(err, SearchError::EnumerationFailed { .. }));
        }

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    }
}
