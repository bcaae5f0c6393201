/// This module defines custom error types for textseek, demonstrating Rust's error handling
/// compared to .NET's exception system.
///
/// # Rust vs .NET Error Handling
///
/// .NET uses exceptions for error handling:
/// ```csharp
/// try {
///     var seeker = new TextSeeker();
///     seeker.Run(request);
/// } catch (DirectoryNotFoundException ex) {
///     // Handle missing directory
/// } catch (UnauthorizedAccessException ex) {
///     // Handle permission error
/// } catch (Exception ex) {
///     // Handle other errors
/// }
/// ```
///
/// Rust uses Result types with custom errors:
/// ```rust,ignore
/// match engine::run(&request, &mut sink) {
///     Ok(summary) => // Render final counts,
///     Err(SearchError::EnumerationFailed { path, .. }) => // Directory unlistable,
///     Err(SearchError::SessionBusy) => // Another search in flight,
///     Err(e) => // Handle other errors
/// }
/// ```
///
/// # Benefits of Rust's Approach
///
/// 1. **Explicit Error Handling**
///    - .NET allows unchecked exceptions
///    - Rust requires explicit handling or propagation
///
/// 2. **Zero-Cost Abstractions**
///    - .NET exceptions have runtime overhead
///    - Rust's Result type has no runtime cost
///
/// 3. **Type Safety**
///    - .NET exceptions are discovered at runtime
///    - Rust errors are checked at compile time
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Cannot list directory {path}: {source}")]
    EnumerationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("A search is already in progress")]
    SessionBusy,
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Canonicalize the path and strip UNC prefixes so that
/// comparisons on Windows are consistent.
pub fn unify_path(original: &Path) -> PathBuf {
    let canonical = original
        .canonicalize()
        .unwrap_or_else(|_| original.to_path_buf());
    strip_unc_prefix(&canonical)
}

/// Strips the Windows UNC prefix (\\?\) from a path if present
fn strip_unc_prefix(p: &Path) -> PathBuf {
    let s = p.display().to_string();
    if let Some(stripped) = s.strip_prefix(r"\\?\") {
        PathBuf::from(stripped)
    } else {
        p.to_path_buf()
    }
}

impl SearchError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn invalid_pattern(pattern: impl Into<String>) -> Self {
        Self::InvalidPattern(pattern.into())
    }

    pub fn enumeration_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let unified = unify_path(&path);
        Self::EnumerationFailed {
            path: unified,
            source,
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// True for errors that abort a whole request rather than a single file.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::EnumerationFailed { .. } | Self::InvalidPattern(_) | Self::ConfigError(_)
        )
    }
}
