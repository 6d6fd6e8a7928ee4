use crate::escape::{escape_html, url_title};

const MEDIA_PREFIXES: &[&str] = &["file:", "image:", "media:"];
const CATEGORY_PREFIX: &str = "category:";
const URL_SCHEMES: &[&str] = &["http://", "https://", "//"];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinkOutput {
    pub html: String,
    /// `[[Category:...]]` names, in order of appearance; they are not rendered
    pub categories: Vec<String>,
}

/// `<a>` for an internal link target.
pub fn link_html(target: &str, label: &str, prefix: &str) -> String {
    let target = target.trim();
    let href = if target.starts_with('#') {
        url_title(target)
    } else {
        format!("{prefix}{}", url_title(target))
    };
    format!("<a href=\"{}\">{label}</a>", escape_html(&href))
}

/// Rewrites `[[target|label]]` and `[url label]` links.
pub fn convert_links(text: &str, prefix: &str) -> LinkOutput {
    let mut out = LinkOutput {
        html: String::with_capacity(text.len() + 64),
        categories: Vec::new(),
    };
    let mut rest = text;

    while let Some(pos) = rest.find('[') {
        out.html.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("[[") {
            if let Some(end) = internal_link_end(tail) {
                let inner = &tail[2..end - 2];
                let after = &tail[end..];
                let trail = after
                    .bytes()
                    .take_while(|b| b.is_ascii_lowercase())
                    .count();
                render_internal(inner, &after[..trail], prefix, &mut out);
                rest = &after[trail..];
                continue;
            }
        } else if let Some(consumed) = render_external(tail, &mut out.html) {
            rest = &tail[consumed..];
            continue;
        }

        out.html.push('[');
        rest = &tail[1..];
    }
    out.html.push_str(rest);
    out
}

/// Byte offset just past the `]]` closing the link at the start of `s`,
/// skipping nested `[[...]]` (file captions carry their own links).
fn internal_link_end(s: &str) -> Option<usize> {
    let b = s.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i + 1 < b.len() {
        match (b[i], b[i + 1]) {
            (b'[', b'[') => {
                depth += 1;
                i += 2;
            }
            (b']', b']') => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return Some(i);
                }
            }
            (b'\n', _) if depth == 1 => return None,
            _ => i += 1,
        }
    }
    None
}

fn render_internal(inner: &str, trail: &str, prefix: &str, out: &mut LinkOutput) {
    let (target, label) = match inner.split_once('|') {
        Some((t, l)) => (t.trim(), Some(l)),
        None => (inner.trim(), None),
    };
    let lower = target.to_lowercase();

    if lower.starts_with(CATEGORY_PREFIX) {
        out.categories
            .push(target[CATEGORY_PREFIX.len()..].trim().to_string());
        return;
    }
    if MEDIA_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return;
    }

    // `[[:Category:X]]` links to the category page instead of tagging.
    let target = target.strip_prefix(':').unwrap_or(target);
    let label = match label.map(str::trim) {
        // Pipe trick: `[[Paris (band)|]]` shows "Paris".
        Some("") => pipe_trick(target).to_string(),
        Some(l) => l.to_string(),
        None => target.to_string(),
    };
    out.html
        .push_str(&link_html(target, &format!("{label}{trail}"), prefix));
}

fn pipe_trick(target: &str) -> &str {
    let t = target.split_once(':').map_or(target, |(_, rest)| rest);
    match t.find(" (") {
        Some(i) if t.ends_with(')') => t[..i].trim(),
        _ => t.trim(),
    }
}

fn render_external(tail: &str, html: &mut String) -> Option<usize> {
    let body = &tail[1..];
    if !URL_SCHEMES.iter().any(|s| body.starts_with(s)) {
        return None;
    }
    let close = body.find(']')?;
    let inner = &body[..close];
    if inner.contains('\n') {
        return None;
    }
    let (url, label) = match inner.split_once(' ') {
        Some((u, l)) if !l.trim().is_empty() => (u, l.trim()),
        Some((u, _)) => (u, u),
        None => (inner, inner),
    };
    html.push_str(&format!(
        "<a class=\"external\" href=\"{}\">{label}</a>",
        escape_html(url)
    ));
    Some(close + 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(text: &str) -> String {
        convert_links(text, "/wiki/").html
    }

    #[test]
    fn test_plain_and_aliased() {
        assert_eq!(
            links("See [[New York City]] and [[Paris|the capital]]."),
            "See <a href=\"/wiki/New_York_City\">New York City</a> and \
             <a href=\"/wiki/Paris\">the capital</a>."
        );
    }

    #[test]
    fn test_fragment_trail_and_pipe_trick() {
        assert_eq!(
            links("[[Paris#Early History]]"),
            "<a href=\"/wiki/Paris#early_history\">Paris#Early History</a>"
        );
        assert_eq!(links("[[cat]]s"), "<a href=\"/wiki/cat\">cats</a>");
        assert_eq!(
            links("[[Mercury (planet)|]]"),
            "<a href=\"/wiki/Mercury_(planet)\">Mercury</a>"
        );
    }

    #[test]
    fn test_categories_and_media_are_not_rendered() {
        let out = convert_links(
            "Text[[Category:Cities in France|Paris]][[File:Eiffel.jpg|thumb|The [[Eiffel Tower]]]].",
            "/wiki/",
        );
        assert_eq!(out.html, "Text.");
        assert_eq!(out.categories, vec!["Cities in France".to_string()]);

        assert_eq!(
            links("[[:Category:Cities]]"),
            "<a href=\"/wiki/Category:Cities\">Category:Cities</a>"
        );
    }

    #[test]
    fn test_external_links() {
        assert_eq!(
            links("[https://example.org Example site] and [http://x.org]"),
            "<a class=\"external\" href=\"https://example.org\">Example site</a> and \
             <a class=\"external\" href=\"http://x.org\">http://x.org</a>"
        );
    }

    #[test]
    fn test_unclosed_brackets_stay_literal() {
        assert_eq!(links("a [[broken\nlink]] [b]"), "a [[broken\nlink]] [b]");
        assert_eq!(links("x[[y"), "x[[y");
    }
}
