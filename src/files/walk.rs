use std::path::Path;

use walkdir::{DirEntry, WalkDir};

use super::filter::{
    classify_file_name, is_acceptable_size, is_ignored_dir, is_ignored_file,
    language_for_extension, looks_like_binary,
};
use crate::models::ParsedFile;

/// List every non-ignored file under `root`, relative and `/`-separated.
///
/// This is the lightweight listing: only ignored directories and ignored
/// file patterns are excluded, nothing is read.
pub fn list_files(root: &Path) -> Vec<String> {
    walk(root)
        .filter(|entry| !is_ignored_file(&entry.file_name().to_string_lossy()))
        .map(|entry| relative_path(root, entry.path()))
        .collect()
}

/// Read every supported text file under `root`.
///
/// Unreadable directories and files are skipped so one bad entry never
/// fails the whole walk.
pub fn parse_files(root: &Path) -> Vec<ParsedFile> {
    let files: Vec<ParsedFile> = walk(root)
        .filter_map(|entry| parse_entry(root, &entry))
        .collect();
    tracing::debug!("Parsed {} files under {}", files.len(), root.display());
    files
}

fn walk(root: &Path) -> impl Iterator<Item = DirEntry> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && is_ignored_dir(&entry.file_name().to_string_lossy())
}

fn parse_entry(root: &Path, entry: &DirEntry) -> Option<ParsedFile> {
    let file_name = entry.file_name().to_string_lossy();
    let extension = classify_file_name(&file_name)?;

    let size = match entry.metadata() {
        Ok(meta) => meta.len(),
        Err(e) => {
            tracing::debug!("Skipping {}: {e}", entry.path().display());
            return None;
        }
    };
    if !is_acceptable_size(size) {
        return None;
    }

    let raw = match std::fs::read(entry.path()) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!("Skipping {}: {e}", entry.path().display());
            return None;
        }
    };
    if looks_like_binary(&raw) {
        return None;
    }

    let language = language_for_extension(&extension).to_string();
    Some(ParsedFile {
        path: relative_path(root, entry.path()),
        extension,
        language,
        content: String::from_utf8_lossy(&raw).into_owned(),
        size_bytes: size,
    })
}

fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, contents: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn sample_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "src/main.rs", b"fn main() {}\n");
        write(root, "src/lib.rs", b"pub mod a;\n");
        write(root, "README", b"# Sample\n");
        write(root, "node_modules/pkg/index.js", b"module.exports = 1;\n");
        write(root, ".git/config", b"[core]\n");
        write(root, "logo.png", b"\x89PNG");
        write(root, "server.log", b"started\n");
        write(root, ".env", b"SECRET=1\n");
        write(root, "empty.txt", b"");
        write(root, "fake.txt", b"text\0with null");
        write(root, "Makefile", b"all:\n");
        dir
    }

    #[test]
    fn test_list_files_skips_ignored_dirs_and_patterns() {
        let dir = sample_tree();
        let files = list_files(dir.path());

        assert!(files.contains(&"src/main.rs".to_string()));
        assert!(files.contains(&"README".to_string()));
        // Listing does not filter by extension or content
        assert!(files.contains(&"logo.png".to_string()));
        assert!(files.contains(&"Makefile".to_string()));

        assert!(!files.iter().any(|f| f.starts_with("node_modules")));
        assert!(!files.iter().any(|f| f.starts_with(".git/")));
        assert!(!files.contains(&"server.log".to_string()));
        assert!(!files.contains(&".env".to_string()));
    }

    #[test]
    fn test_parse_files_applies_all_filters() {
        let dir = sample_tree();
        let parsed = parse_files(dir.path());
        let mut paths: Vec<&str> = parsed.iter().map(|f| f.path.as_str()).collect();
        paths.sort();

        assert_eq!(paths, vec!["README", "src/lib.rs", "src/main.rs"]);
    }

    #[test]
    fn test_parse_files_populates_metadata() {
        let dir = sample_tree();
        let parsed = parse_files(dir.path());

        let main = parsed.iter().find(|f| f.path == "src/main.rs").unwrap();
        assert_eq!(main.extension, ".rs");
        assert_eq!(main.language, "rust");
        assert_eq!(main.content, "fn main() {}\n");
        assert_eq!(main.size_bytes, 13);

        let readme = parsed.iter().find(|f| f.path == "README").unwrap();
        assert_eq!(readme.extension, ".md");
        assert_eq!(readme.language, "markdown");
    }

    #[test]
    fn test_parse_files_skips_oversized() {
        let dir = tempfile::tempdir().unwrap();
        let big = vec![b'a'; (crate::files::filter::MAX_FILE_SIZE + 1) as usize];
        write(dir.path(), "big.txt", &big);
        write(dir.path(), "small.txt", b"ok\n");

        let parsed = parse_files(dir.path());
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].path, "small.txt");
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(list_files(&missing).is_empty());
        assert!(parse_files(&missing).is_empty());
    }
}
