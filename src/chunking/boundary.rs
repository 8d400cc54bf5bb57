//! Boundary scoring: how good a line is as the first line of a new chunk.

use once_cell::sync::Lazy;
use regex::Regex;

/// Strongest signal first. The score of a match is its distance from the end
/// of the list, so declarations outrank headings and headings outrank blank lines.
const BOUNDARY_PATTERNS: &[&str] = &[
    // class declarations
    r"^(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+",
    // function declarations
    r"^(?:export\s+)?(?:default\s+)?(?:async\s+)?function[\s*(]",
    // Rust items
    r"^(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:fn|struct|enum|trait|impl|mod)\b",
    // Go functions
    r"^func\s+",
    // top-level assignments
    r"^(?:export\s+)?(?:const|let|var)\s+\w+\s*=",
    // TS type declarations
    r"^(?:export\s+)?(?:interface|type|enum)\s+",
    // Python functions
    r"^(?:async\s+)?def\s+",
    // markdown headings
    r"^#{1,3}\s+",
    // blank line
    r"^\s*$",
];

static COMPILED: Lazy<Vec<Regex>> = Lazy::new(|| {
    BOUNDARY_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("boundary pattern is a valid regex"))
        .collect()
});

/// Score a line as a split point. Zero means "not a boundary".
///
/// Leading whitespace is ignored, so indented declarations count too.
/// First matching pattern wins.
pub fn boundary_score(line: &str) -> usize {
    let trimmed = line.trim_start();
    COMPILED
        .iter()
        .position(|re| re.is_match(trimmed))
        .map(|i| COMPILED.len() - i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declarations_outrank_headings_and_blank_lines() {
        let class = boundary_score("export class Parser {");
        let function = boundary_score("function parse(input) {");
        let heading = boundary_score("## Usage");
        let blank = boundary_score("\n");

        assert!(class > function);
        assert!(function > heading);
        assert!(heading > blank);
        assert!(blank > 0);
    }

    #[test]
    fn test_language_specific_declarations() {
        assert!(boundary_score("pub fn chunk(content: &str) {") > 0);
        assert!(boundary_score("pub(crate) struct Store {") > 0);
        assert!(boundary_score("impl<T> Foo for T {") > 0);
        assert!(boundary_score("func main() {") > 0);
        assert!(boundary_score("async def handler(request):") > 0);
        assert!(boundary_score("export interface Props {") > 0);
        assert!(boundary_score("const limit = 10;") > 0);
    }

    #[test]
    fn test_indented_declaration_still_counts() {
        assert!(boundary_score("    def method(self):") > 0);
    }

    #[test]
    fn test_ordinary_lines_score_zero() {
        assert_eq!(boundary_score("    total += 1;"), 0);
        assert_eq!(boundary_score("return value"), 0);
        assert_eq!(boundary_score("#[derive(Debug)]"), 0);
        assert_eq!(boundary_score("functional = true"), 0);
        assert_eq!(boundary_score("#### deep heading"), 0);
    }
}
