#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn from_marker(b: u8) -> Option<Self> {
        match b {
            b'*' => Some(ListKind::Unordered),
            b'#' => Some(ListKind::Ordered),
            _ => None,
        }
    }

    fn open(self) -> &'static str {
        match self {
            ListKind::Unordered => "<ul>",
            ListKind::Ordered => "<ol>",
        }
    }

    fn close(self) -> &'static str {
        match self {
            ListKind::Unordered => "</ul>",
            ListKind::Ordered => "</ol>",
        }
    }
}

/// One open nesting level and whether its current `<li>` is still open.
struct Level {
    kind: ListKind,
    item_open: bool,
}

/// Runs of `*`/`#` lines become nested lists. Each list block is emitted on a
/// single line so later block-level stages treat it as one unit.
pub fn convert_lists(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    let mut levels: Vec<Level> = Vec::new();
    let mut first = true;

    for line in text.split('\n') {
        match list_item(line) {
            Some((kind, depth, body)) => {
                if levels.first().is_some_and(|l| l.kind != kind) {
                    close_all(&mut levels, &mut out);
                }
                if levels.is_empty() && !first {
                    out.push('\n');
                }
                push_item(&mut levels, kind, depth, body, &mut out);
            }
            None => {
                close_all(&mut levels, &mut out);
                if !first {
                    out.push('\n');
                }
                out.push_str(line);
            }
        }
        first = false;
    }
    close_all(&mut levels, &mut out);
    out
}

fn list_item(line: &str) -> Option<(ListKind, usize, &str)> {
    let first = *line.as_bytes().first()?;
    let kind = ListKind::from_marker(first)?;
    if kind == ListKind::Ordered && line.get(..9).is_some_and(|p| p.eq_ignore_ascii_case("#redirect")) {
        return None;
    }
    let depth = line.bytes().take_while(|&b| b == first).count();
    Some((kind, depth, line[depth..].trim()))
}

fn push_item(levels: &mut Vec<Level>, kind: ListKind, depth: usize, body: &str, out: &mut String) {
    while levels.len() < depth {
        // Skipped levels (`*` straight to `***`) get an empty carrier item.
        if let Some(top) = levels.last_mut() {
            if !top.item_open {
                out.push_str("<li>");
                top.item_open = true;
            }
        }
        out.push_str(kind.open());
        levels.push(Level {
            kind,
            item_open: false,
        });
    }
    while levels.len() > depth {
        close_level(levels, out);
    }
    if let Some(top) = levels.last_mut() {
        if top.item_open {
            out.push_str("</li>");
        }
        out.push_str("<li>");
        out.push_str(body);
        top.item_open = true;
    }
}

fn close_level(levels: &mut Vec<Level>, out: &mut String) {
    if let Some(level) = levels.pop() {
        if level.item_open {
            out.push_str("</li>");
        }
        out.push_str(level.kind.close());
    }
}

fn close_all(levels: &mut Vec<Level>, out: &mut String) {
    while !levels.is_empty() {
        close_level(levels, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_step_up_one_step_down() {
        let html = convert_lists("* a\n** b\n* c");
        assert_eq!(html, "<ul><li>a<ul><li>b</li></ul></li><li>c</li></ul>");
        assert_eq!(html.matches("<ul>").count(), html.matches("</ul>").count());
        assert_eq!(html.matches("<li>").count(), html.matches("</li>").count());
    }

    #[test]
    fn test_ordered_and_surrounding_text() {
        assert_eq!(
            convert_lists("Steps:\n# one\n# two\nDone."),
            "Steps:\n<ol><li>one</li><li>two</li></ol>\nDone."
        );
    }

    #[test]
    fn test_switching_marker_starts_a_new_list() {
        assert_eq!(
            convert_lists("* a\n# b"),
            "<ul><li>a</li></ul>\n<ol><li>b</li></ol>"
        );
    }

    #[test]
    fn test_skipped_depth_and_deep_close() {
        assert_eq!(
            convert_lists("* a\n*** c\n* d"),
            "<ul><li>a<ul><li><ul><li>c</li></ul></li></ul></li><li>d</li></ul>"
        );
    }

    #[test]
    fn test_redirect_is_not_a_list() {
        assert_eq!(
            convert_lists("#REDIRECT [[Target]]"),
            "#REDIRECT [[Target]]"
        );
    }
}
