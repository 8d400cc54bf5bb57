//! Greedy line-based chunking that prefers semantic boundaries.
//!
//! Lines are accumulated into a buffer. The buffer is flushed before a line
//! that would push it past [`CHUNK_MAX`], and, once it holds at least
//! [`CHUNK_TARGET`] characters, before the next line whenever that line looks
//! like the start of a new unit (see [`boundary::boundary_score`]).
//!
//! Chunks keep their trailing newlines, so concatenating a file's chunks in
//! index order gives back the file exactly. Lengths are counted in chars.

pub mod boundary;

use crate::models::{FileChunk, ParsedFile};
use boundary::boundary_score;

/// Soft target: once reached, the next boundary line ends the chunk.
pub const CHUNK_TARGET: usize = 1200;
/// Hard ceiling on chunk length.
pub const CHUNK_MAX: usize = 1500;

/// Output of the chunking process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOutput {
    pub content: String,
    /// 1-based start line in the original file.
    pub start_line: usize,
    /// 1-based end line in the original file.
    pub end_line: usize,
}

/// A line, or a ceiling-sized slice of an overlong line.
struct Piece<'a> {
    text: &'a str,
    chars: usize,
    line: usize,
    /// True for the second and later slices of one physical line.
    continuation: bool,
}

/// Split one file's text into chunks.
pub fn chunk_content(content: &str) -> Vec<ChunkOutput> {
    if content.chars().count() <= CHUNK_MAX {
        return vec![ChunkOutput {
            content: content.to_string(),
            start_line: 1,
            end_line: content.split_inclusive('\n').count().max(1),
        }];
    }

    let pieces = split_pieces(content);
    let mut chunks = Vec::new();
    let mut buffer = Buffer::default();

    for (i, piece) in pieces.iter().enumerate() {
        if buffer.chars + piece.chars > CHUNK_MAX && !buffer.is_empty() {
            chunks.push(buffer.take());
        }
        buffer.push(piece);

        if buffer.chars >= CHUNK_TARGET {
            if let Some(next) = pieces.get(i + 1) {
                let next_is_boundary = !next.continuation && boundary_score(next.text) > 0;
                if next_is_boundary || buffer.chars >= CHUNK_MAX {
                    chunks.push(buffer.take());
                }
            }
        }
    }

    if !buffer.is_empty() {
        chunks.push(buffer.take());
    }

    chunks
}

/// Chunk every parsed file into one flat pool.
pub fn chunk_files(files: &[ParsedFile]) -> Vec<FileChunk> {
    files
        .iter()
        .flat_map(|file| {
            chunk_content(&file.content)
                .into_iter()
                .enumerate()
                .map(move |(i, c)| FileChunk {
                    file_path: file.path.clone(),
                    chunk_index: i,
                    language: file.language.clone(),
                    content: c.content,
                    start_line: c.start_line,
                    end_line: c.end_line,
                })
        })
        .collect()
}

#[derive(Default)]
struct Buffer {
    content: String,
    chars: usize,
    start_line: usize,
    end_line: usize,
}

impl Buffer {
    fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    fn push(&mut self, piece: &Piece<'_>) {
        if self.is_empty() {
            self.start_line = piece.line;
        }
        self.content.push_str(piece.text);
        self.chars += piece.chars;
        self.end_line = piece.line;
    }

    fn take(&mut self) -> ChunkOutput {
        let taken = std::mem::take(self);
        ChunkOutput {
            content: taken.content,
            start_line: taken.start_line,
            end_line: taken.end_line,
        }
    }
}

fn split_pieces(content: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();

    for (idx, line) in content.split_inclusive('\n').enumerate() {
        let line_no = idx + 1;
        let chars = line.chars().count();
        if chars <= CHUNK_MAX {
            pieces.push(Piece {
                text: line,
                chars,
                line: line_no,
                continuation: false,
            });
            continue;
        }

        // Overlong line: cut at char boundaries every CHUNK_MAX chars
        let mut start = 0;
        let mut count = 0;
        let mut continuation = false;
        for (byte_idx, _) in line.char_indices() {
            if count == CHUNK_MAX {
                pieces.push(Piece {
                    text: &line[start..byte_idx],
                    chars: count,
                    line: line_no,
                    continuation,
                });
                start = byte_idx;
                count = 0;
                continuation = true;
            }
            count += 1;
        }
        pieces.push(Piece {
            text: &line[start..],
            chars: count,
            line: line_no,
            continuation,
        });
    }

    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_len(s: &str) -> usize {
        s.chars().count()
    }

    fn rejoin(chunks: &[ChunkOutput]) -> String {
        chunks.iter().map(|c| c.content.as_str()).collect()
    }

    fn filler(lines: usize) -> String {
        (0..lines).map(|i| format!("    total += {i:04};\n")).collect()
    }

    #[test]
    fn test_small_file_is_single_chunk() {
        let content = "fn main() {\n    println!(\"hi\");\n}\n";
        let chunks = chunk_content(content);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, content);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 3);
    }

    #[test]
    fn test_exactly_ceiling_is_single_chunk() {
        let content = "a".repeat(CHUNK_MAX);
        assert_eq!(chunk_content(&content).len(), 1);
    }

    #[test]
    fn test_empty_content_is_single_chunk() {
        let chunks = chunk_content("");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "");
    }

    #[test]
    fn test_round_trip_and_ceiling() {
        let mut content = String::new();
        content.push_str("# Title\n\n");
        content.push_str(&filler(60));
        content.push_str("\nclass Widget {\n");
        content.push_str(&filler(90));
        content.push_str(&"x".repeat(4000));
        content.push('\n');
        content.push_str("def tail():\n    return 1\n");

        let chunks = chunk_content(&content);
        assert!(chunks.len() > 2);
        assert_eq!(rejoin(&chunks), content);
        for chunk in &chunks {
            assert!(char_len(&chunk.content) <= CHUNK_MAX);
        }
    }

    #[test]
    fn test_round_trip_multibyte_text() {
        let line = "let greeting = \"héllo wörld 🌍\"; // ünïcödé\n";
        let content = line.repeat(100);
        let chunks = chunk_content(&content);
        assert!(chunks.len() > 1);
        assert_eq!(rejoin(&chunks), content);
        assert!(chunks.iter().all(|c| char_len(&c.content) <= CHUNK_MAX));
    }

    #[test]
    fn test_overlong_line_is_cut_at_ceiling() {
        let content = "é".repeat(CHUNK_MAX * 2 + 10);
        let chunks = chunk_content(&content);
        assert_eq!(chunks.len(), 3);
        assert_eq!(char_len(&chunks[0].content), CHUNK_MAX);
        assert_eq!(char_len(&chunks[1].content), CHUNK_MAX);
        assert_eq!(char_len(&chunks[2].content), 10);
        assert!(chunks.iter().all(|c| c.start_line == 1 && c.end_line == 1));
        assert_eq!(rejoin(&chunks), content);
    }

    #[test]
    fn test_splits_before_declaration_after_target() {
        // Function declaration lands between the soft target and the ceiling
        let mut content = String::new();
        while char_len(&content) < 1300 {
            content.push_str("    total += 1;\n");
        }
        let prefix_len = char_len(&content);
        content.push_str("fn middle() {\n");
        while char_len(&content) < 3000 {
            content.push_str("    total += 1;\n");
        }

        let chunks = chunk_content(&content);
        assert!(chunks.len() >= 2);
        assert!(char_len(&chunks[0].content) >= CHUNK_TARGET);
        assert_eq!(char_len(&chunks[0].content), prefix_len);
        assert!(chunks[1].content.starts_with("fn middle()"));
        assert_eq!(rejoin(&chunks), content);
    }

    #[test]
    fn test_never_splits_before_target() {
        // Blank lines everywhere, but nothing may be flushed under the target
        let content = "word word word\n\n".repeat(200);
        let chunks = chunk_content(&content);
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(char_len(&chunk.content) >= CHUNK_TARGET);
        }
    }

    #[test]
    fn test_line_numbers_are_contiguous() {
        let content = filler(300);
        let chunks = chunk_content(&content);
        assert_eq!(chunks[0].start_line, 1);
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].start_line, pair[0].end_line + 1);
        }
        assert_eq!(chunks.last().unwrap().end_line, 300);
    }

    #[test]
    fn test_chunk_files_assigns_sequential_indices() {
        let files = vec![
            ParsedFile {
                path: "src/big.rs".into(),
                extension: ".rs".into(),
                language: "rust".into(),
                content: filler(300),
                size_bytes: 0,
            },
            ParsedFile {
                path: "README.md".into(),
                extension: ".md".into(),
                language: "markdown".into(),
                content: "# Readme\n".into(),
                size_bytes: 9,
            },
        ];

        let chunks = chunk_files(&files);
        let big: Vec<_> = chunks.iter().filter(|c| c.file_path == "src/big.rs").collect();
        assert!(big.len() > 1);
        for (i, chunk) in big.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
            assert_eq!(chunk.language, "rust");
        }

        let readme: Vec<_> = chunks.iter().filter(|c| c.file_path == "README.md").collect();
        assert_eq!(readme.len(), 1);
        assert_eq!(readme[0].chunk_index, 0);
        assert_eq!(readme[0].language, "markdown");
    }
}
