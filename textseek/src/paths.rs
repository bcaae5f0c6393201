use std::path::{Component, Path, PathBuf};

/// Resolves a user-supplied directory argument to an absolute path.
///
/// An empty argument means the current working directory. The result is
/// normalized lexically (`.` and `..` segments folded) without touching the
/// filesystem, so a non-existent directory resolves cleanly and simply
/// yields no candidate files downstream.
pub fn resolve_directory(directory: &Path) -> PathBuf {
    if directory.as_os_str().is_empty() {
        return current_dir();
    }
    let absolute = if directory.is_absolute() {
        directory.to_path_buf()
    } else {
        current_dir().join(directory)
    };
    normalize(&absolute)
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Folds `.` and `..` components without resolving symlinks
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // A leading `..` at the root has nowhere to go; drop it
                normalized.pop();
            }
            _ => normalized.push(component.as_os_str()),
        }
    }
    normalized
}
