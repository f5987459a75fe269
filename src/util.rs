use anyhow::{anyhow, Result};
use std::fs::File;
use std::path::Path;

/// Opens a file, naming its `kind` (e.g. "project") in the error.
pub fn open(path: &Path, kind: &str) -> Result<File> {
    match File::open(path) {
        Err(e) => Err(anyhow!("Opening {} file `{}`: {}", kind, path.display(), e)),
        Ok(file) => Ok(file),
    }
}

/// Returns true for hidden and private entries (names starting with `.` or
/// `_`), which are never rendered, listed, or copied.
pub fn is_private(path: &Path) -> bool {
    path.file_name()
        .map(|name| {
            let name = name.to_string_lossy();
            name.starts_with('.') || name.starts_with('_')
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_is_private() {
        assert!(is_private(Path::new("posts/_draft.md")));
        assert!(is_private(Path::new(".git")));
        assert!(!is_private(Path::new("posts/hello.md")));
        assert!(!is_private(Path::new("posts_2020/a.md")));
    }
}
