//! Brace-depth scanning for `{{...}}` invocations.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Outside,
    /// Inside an invocation opened at `start`; `depth` counts open braces.
    Capturing { start: usize, depth: usize },
}

/// Byte ranges of every top-level balanced `{{...}}` span, left to right.
///
/// Nested invocations are part of their enclosing span. An unterminated span
/// is not reported and stays literal text.
pub fn find_invocations(text: &str) -> Vec<Range<usize>> {
    let b = text.as_bytes();
    let mut spans = Vec::new();
    let mut state = ScanState::Outside;
    let mut i = 0;

    while i + 1 < b.len() {
        match (b[i], b[i + 1], state) {
            (b'{', b'{', ScanState::Outside) => {
                state = ScanState::Capturing { start: i, depth: 2 };
                i += 2;
            }
            (b'{', b'{', ScanState::Capturing { start, depth }) => {
                state = ScanState::Capturing {
                    start,
                    depth: depth + 2,
                };
                i += 2;
            }
            (b'}', b'}', ScanState::Capturing { start, depth }) => {
                let depth = depth - 2;
                i += 2;
                state = if depth == 0 {
                    spans.push(start..i);
                    ScanState::Outside
                } else {
                    ScanState::Capturing { start, depth }
                };
            }
            _ => i += 1,
        }
    }
    spans
}

/// Splits an invocation body on `|` that sit outside nested `{{ }}` and `[[ ]]`.
pub fn split_args(inner: &str) -> Vec<&str> {
    let b = inner.as_bytes();
    let mut parts = Vec::new();
    let mut braces = 0usize;
    let mut brackets = 0usize;
    let mut last = 0;
    let mut i = 0;

    while i < b.len() {
        let pair = (b[i], b.get(i + 1).copied());
        match pair {
            (b'{', Some(b'{')) => {
                braces += 1;
                i += 2;
            }
            (b'}', Some(b'}')) if braces > 0 => {
                braces -= 1;
                i += 2;
            }
            (b'[', Some(b'[')) => {
                brackets += 1;
                i += 2;
            }
            (b']', Some(b']')) if brackets > 0 => {
                brackets -= 1;
                i += 2;
            }
            (b'|', _) if braces == 0 && brackets == 0 => {
                parts.push(&inner[last..i]);
                i += 1;
                last = i;
            }
            _ => i += 1,
        }
    }
    parts.push(&inner[last..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(text: &str) -> Vec<&str> {
        find_invocations(text)
            .into_iter()
            .map(|r| &text[r])
            .collect()
    }

    #[test]
    fn test_top_level_spans_only() {
        assert_eq!(
            spans("a {{x}} b {{outer|{{inner|{{deep}}}}}} c"),
            vec!["{{x}}", "{{outer|{{inner|{{deep}}}}}}"]
        );
    }

    #[test]
    fn test_unterminated_and_stray_braces() {
        assert!(spans("{{never closed").is_empty());
        assert_eq!(spans("}} {{ok}} }}"), vec!["{{ok}}"]);
        assert_eq!(spans("{{a\n|b=1\n}}"), vec!["{{a\n|b=1\n}}"]);
    }

    #[test]
    fn test_split_args_respects_nesting() {
        assert_eq!(
            split_args("cite web|title={{lang|fr|Paris}}|url=x"),
            vec!["cite web", "title={{lang|fr|Paris}}", "url=x"]
        );
        assert_eq!(split_args("main|[[A|B]]|C"), vec!["main", "[[A|B]]", "C"]);
        assert_eq!(split_args("reflist"), vec!["reflist"]);
        assert_eq!(split_args("x||"), vec!["x", "", ""]);
    }
}
