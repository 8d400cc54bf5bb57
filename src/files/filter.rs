//! Pure predicates deciding which files are worth reading.
//!
//! Name-based checks run before any I/O; [`looks_like_binary`] inspects the
//! bytes once a file has been read. Keeping them separate lets each be
//! tested on crafted inputs without touching the filesystem.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Files larger than this are skipped (500 KB).
pub const MAX_FILE_SIZE: u64 = 500 * 1024;

/// How many leading bytes are scanned for a null byte.
pub const BINARY_SNIFF_LEN: usize = 8192;

const IGNORED_FILE_SOURCES: &[&str] = &[r"(?i)\.log$", r"(?i)\.env(\..*)?$"];

static IGNORED_FILE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    IGNORED_FILE_SOURCES
        .iter()
        .map(|p| Regex::new(p).expect("ignored file pattern is a valid regex"))
        .collect()
});

/// Directories never descended into: VCS metadata, build output, dependency caches.
pub fn is_ignored_dir(name: &str) -> bool {
    matches!(
        name,
        "node_modules"
            | ".git"
            | "dist"
            | "build"
            | ".next"
            | "__pycache__"
            | ".venv"
            | "venv"
            | "target"
    )
}

/// Log files and environment files, matched on the basename.
pub fn is_ignored_file(file_name: &str) -> bool {
    IGNORED_FILE_PATTERNS.iter().any(|re| re.is_match(file_name))
}

/// Lowercased extension with its leading dot.
///
/// A few well-known extensionless names are mapped to an extension so they
/// survive the supported-extension check: README, LICENSE and CHANGELOG read
/// as markdown, Dockerfile as `.dockerfile`.
pub fn effective_extension(file_name: &str) -> String {
    let ext = Path::new(file_name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default();
    if !ext.is_empty() {
        return ext;
    }

    match file_name.to_lowercase().as_str() {
        "readme" | "license" | "changelog" => ".md".to_string(),
        "dockerfile" => ".dockerfile".to_string(),
        _ => String::new(),
    }
}

pub fn is_binary_extension(ext: &str) -> bool {
    matches!(
        ext,
        ".png"
            | ".jpg"
            | ".jpeg"
            | ".gif"
            | ".bmp"
            | ".ico"
            | ".webp"
            | ".avif"
            | ".mp3"
            | ".mp4"
            | ".wav"
            | ".ogg"
            | ".webm"
            | ".mov"
            | ".avi"
            | ".zip"
            | ".tar"
            | ".gz"
            | ".bz2"
            | ".7z"
            | ".rar"
            | ".pdf"
            | ".doc"
            | ".docx"
            | ".xls"
            | ".xlsx"
            | ".ppt"
            | ".pptx"
            | ".exe"
            | ".dll"
            | ".so"
            | ".dylib"
            | ".bin"
            | ".woff"
            | ".woff2"
            | ".ttf"
            | ".eot"
            | ".otf"
            | ".pyc"
            | ".class"
            | ".o"
            | ".obj"
            | ".lock"
    )
}

pub fn is_supported_extension(ext: &str) -> bool {
    matches!(
        ext,
        ".ts"
            | ".tsx"
            | ".js"
            | ".jsx"
            | ".py"
            | ".java"
            | ".go"
            | ".rs"
            | ".json"
            | ".yaml"
            | ".yml"
            | ".toml"
            | ".md"
            | ".txt"
            | ".html"
            | ".css"
            | ".scss"
            | ".sh"
            | ".bash"
            | ".c"
            | ".cpp"
            | ".h"
            | ".rb"
            | ".php"
            | ".swift"
            | ".kt"
            | ".sql"
            | ".graphql"
            | ".dockerfile"
            | ".xml"
            | ".svg"
    )
}

/// Apply the name-based checks in order (ignored pattern, binary extension,
/// supported extension). Returns the effective extension for files that pass.
pub fn classify_file_name(file_name: &str) -> Option<String> {
    if is_ignored_file(file_name) {
        return None;
    }
    let ext = effective_extension(file_name);
    if is_binary_extension(&ext) || !is_supported_extension(&ext) {
        return None;
    }
    Some(ext)
}

/// Zero-length files and files over [`MAX_FILE_SIZE`] are not read.
pub fn is_acceptable_size(size: u64) -> bool {
    size > 0 && size <= MAX_FILE_SIZE
}

/// Content sniffing: a null byte in the first 8 KB marks the file as binary,
/// whatever its extension says.
pub fn looks_like_binary(bytes: &[u8]) -> bool {
    let scan = bytes.len().min(BINARY_SNIFF_LEN);
    bytes[..scan].contains(&0)
}

/// Language tag for an effective extension; `plaintext` when unknown.
pub fn language_for_extension(ext: &str) -> &'static str {
    match ext {
        ".ts" | ".tsx" => "typescript",
        ".js" | ".jsx" => "javascript",
        ".py" => "python",
        ".java" => "java",
        ".go" => "go",
        ".rs" => "rust",
        ".json" => "json",
        ".yaml" | ".yml" => "yaml",
        ".toml" => "toml",
        ".md" => "markdown",
        ".txt" => "plaintext",
        ".html" => "html",
        ".css" => "css",
        ".scss" => "scss",
        ".sh" | ".bash" => "shell",
        ".c" | ".h" => "c",
        ".cpp" => "cpp",
        ".rb" => "ruby",
        ".php" => "php",
        ".swift" => "swift",
        ".kt" => "kotlin",
        ".sql" => "sql",
        ".graphql" => "graphql",
        ".xml" => "xml",
        ".svg" => "svg",
        ".dockerfile" => "dockerfile",
        _ => "plaintext",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignored_file_patterns_compile() {
        assert_eq!(IGNORED_FILE_PATTERNS.len(), IGNORED_FILE_SOURCES.len());
    }

    #[test]
    fn test_ignored_files() {
        assert!(is_ignored_file("debug.log"));
        assert!(is_ignored_file("SERVER.LOG"));
        assert!(is_ignored_file(".env"));
        assert!(is_ignored_file(".env.local"));
        assert!(is_ignored_file("prod.env"));
        assert!(!is_ignored_file("environment.rs"));
        assert!(!is_ignored_file("logger.ts"));
    }

    #[test]
    fn test_ignored_dirs() {
        assert!(is_ignored_dir("node_modules"));
        assert!(is_ignored_dir(".git"));
        assert!(is_ignored_dir("__pycache__"));
        assert!(!is_ignored_dir("src"));
    }

    #[test]
    fn test_effective_extension() {
        assert_eq!(effective_extension("main.RS"), ".rs");
        assert_eq!(effective_extension("README"), ".md");
        assert_eq!(effective_extension("License"), ".md");
        assert_eq!(effective_extension("CHANGELOG"), ".md");
        assert_eq!(effective_extension("Dockerfile"), ".dockerfile");
        assert_eq!(effective_extension("Makefile"), "");
        assert_eq!(effective_extension("archive.tar.gz"), ".gz");
    }

    #[test]
    fn test_classify_file_name() {
        assert_eq!(classify_file_name("lib.rs").as_deref(), Some(".rs"));
        assert_eq!(classify_file_name("readme").as_deref(), Some(".md"));
        assert!(classify_file_name("logo.png").is_none());
        assert!(classify_file_name("Cargo.lock").is_none());
        assert!(classify_file_name("Makefile").is_none());
        assert!(classify_file_name("notes.docx").is_none());
        assert!(classify_file_name("unknown.xyz").is_none());
        assert!(classify_file_name("app.log").is_none());
    }

    #[test]
    fn test_size_limits() {
        assert!(!is_acceptable_size(0));
        assert!(is_acceptable_size(1));
        assert!(is_acceptable_size(MAX_FILE_SIZE));
        assert!(!is_acceptable_size(MAX_FILE_SIZE + 1));
    }

    #[test]
    fn test_looks_like_binary_detects_null_byte() {
        assert!(looks_like_binary(b"abc\0def"));
        assert!(!looks_like_binary(b"plain text\n"));
        assert!(!looks_like_binary(b""));
    }

    #[test]
    fn test_looks_like_binary_only_scans_prefix() {
        let mut buf = vec![b'a'; BINARY_SNIFF_LEN];
        buf.push(0);
        assert!(!looks_like_binary(&buf));

        buf[BINARY_SNIFF_LEN - 1] = 0;
        assert!(looks_like_binary(&buf));
    }

    #[test]
    fn test_language_lookup() {
        assert_eq!(language_for_extension(".tsx"), "typescript");
        assert_eq!(language_for_extension(".h"), "c");
        assert_eq!(language_for_extension(".md"), "markdown");
        assert_eq!(language_for_extension(".weird"), "plaintext");
    }
}
