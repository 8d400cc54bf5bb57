use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};

use zip::ZipArchive;

use crate::error::AppError;

/// Where one archive entry will be written.
struct Planned {
    index: usize,
    destination: PathBuf,
    is_dir: bool,
}

/// Resolve an entry name against `target` without touching the filesystem.
///
/// Backslashes are treated as separators. `..` may only climb back out of
/// directories the name itself entered; absolute names and drive prefixes are
/// rejected. `Ok(None)` means the entry names the target itself.
fn entry_destination(target: &Path, name: &str) -> Result<Option<PathBuf>, AppError> {
    let normalized = name.replace('\\', "/");
    let mut destination = target.to_path_buf();
    let mut depth = 0usize;

    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => {
                destination.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir if depth > 0 => {
                destination.pop();
                depth -= 1;
            }
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(reject(target, name));
            }
        }
    }

    Ok((depth > 0).then_some(destination))
}

fn reject(target: &Path, name: &str) -> AppError {
    tracing::warn!(
        target: "security",
        "Rejected archive entry {name:?}: resolves outside {}",
        target.display()
    );
    AppError::PathTraversal(name.to_string())
}

/// Check a directory that now exists on disk is still under the canonical root.
fn ensure_inside(canonical_root: &Path, dir: &Path, name: &str) -> Result<(), AppError> {
    let canonical = dir.canonicalize()?;
    if canonical.starts_with(canonical_root) {
        Ok(())
    } else {
        Err(reject(canonical_root, name))
    }
}

/// Extract a ZIP archive held in memory into `target`, which must exist.
///
/// Every entry name is validated before anything is written, so an archive
/// with a single escaping entry leaves nothing behind. Returns the number of
/// files written.
pub fn extract_archive(bytes: &[u8], target: &Path) -> Result<usize, AppError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| AppError::InvalidSource(format!("not a valid zip archive: {e}")))?;

    let mut plan = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive
            .by_index_raw(index)
            .map_err(|e| AppError::AcquisitionFailed(format!("unreadable archive entry {index}: {e}")))?;
        if let Some(destination) = entry_destination(target, entry.name())? {
            plan.push(Planned {
                index,
                destination,
                is_dir: entry.is_dir(),
            });
        }
    }

    let canonical_root = target.canonicalize()?;
    let mut written = 0;

    for Planned {
        index,
        destination,
        is_dir,
    } in plan
    {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| AppError::AcquisitionFailed(format!("unreadable archive entry {index}: {e}")))?;
        let name = entry.name().to_string();

        if is_dir {
            std::fs::create_dir_all(&destination)?;
            ensure_inside(&canonical_root, &destination, &name)?;
            continue;
        }

        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
            ensure_inside(&canonical_root, parent, &name)?;
        }

        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buf)
            .map_err(|e| AppError::AcquisitionFailed(format!("failed to decompress {name}: {e}")))?;
        std::fs::write(&destination, &buf)?;
        written += 1;
    }

    tracing::info!("Extracted {written} files into {}", target.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    enum Entry<'a> {
        File(&'a str, &'a str),
        Dir(&'a str),
    }

    fn build_zip(entries: &[Entry<'_>]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for entry in entries {
            match entry {
                Entry::File(name, content) => {
                    writer.start_file(*name, options).unwrap();
                    writer.write_all(content.as_bytes()).unwrap();
                }
                Entry::Dir(name) => writer.add_directory(*name, options).unwrap(),
            }
        }
        writer.finish().unwrap().into_inner()
    }

    fn count_files(root: &Path) -> usize {
        walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .count()
    }

    #[test]
    fn test_extracts_files_and_directories() {
        let dir = TempDir::new().unwrap();
        let bytes = build_zip(&[
            Entry::Dir("project/"),
            Entry::Dir("project/empty/"),
            Entry::File("project/src/main.rs", "fn main() {}\n"),
            Entry::File("project/README.md", "# Project\n"),
        ]);

        let written = extract_archive(&bytes, dir.path()).unwrap();
        assert_eq!(written, 2);
        assert!(dir.path().join("project/empty").is_dir());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("project/src/main.rs")).unwrap(),
            "fn main() {}\n"
        );
    }

    #[test]
    fn test_traversal_entry_rejects_whole_archive() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("extract");
        std::fs::create_dir(&target).unwrap();

        let bytes = build_zip(&[
            Entry::File("good.txt", "fine"),
            Entry::File("../evil.txt", "pwned"),
            Entry::File("later.txt", "never written"),
        ]);

        let err = extract_archive(&bytes, &target).unwrap_err();
        assert!(matches!(err, AppError::PathTraversal(ref name) if name == "../evil.txt"));
        assert!(!dir.path().join("evil.txt").exists());
        assert_eq!(count_files(&target), 0);
    }

    #[test]
    fn test_entry_destination_rules() {
        let root = Path::new("/srv/repos/abc");

        assert_eq!(
            entry_destination(root, "a/b/../c.txt").unwrap(),
            Some(root.join("a/c.txt"))
        );
        assert_eq!(
            entry_destination(root, "./a.txt").unwrap(),
            Some(root.join("a.txt"))
        );
        assert_eq!(entry_destination(root, "./").unwrap(), None);

        for evil in ["../x", "a/../../x", "/etc/passwd", "..\\..\\x", "a\\..\\..\\x"] {
            assert!(
                matches!(entry_destination(root, evil), Err(AppError::PathTraversal(_))),
                "{evil} should be rejected"
            );
        }
    }

    #[test]
    fn test_invalid_archive_is_invalid_source() {
        let dir = TempDir::new().unwrap();
        let err = extract_archive(b"definitely not a zip", dir.path()).unwrap_err();
        assert!(matches!(err, AppError::InvalidSource(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_inside_target_is_caught() {
        let outside = TempDir::new().unwrap();
        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        let bytes = build_zip(&[Entry::File("link/escaped.txt", "x")]);
        let err = extract_archive(&bytes, dir.path()).unwrap_err();
        assert!(matches!(err, AppError::PathTraversal(_)));
        assert!(!outside.path().join("escaped.txt").exists());
    }
}
