/// Escapes text for use in element content and double-quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Article title as it appears in a URL path: spaces become underscores and
/// the fragment, if any, is lowercased.
pub fn url_title(target: &str) -> String {
    let target = target.trim().replace(' ', "_");
    match target.split_once('#') {
        Some((page, frag)) => format!("{page}#{}", frag.to_lowercase()),
        None => target,
    }
}

/// Anchor id for a heading, matching the fragments produced by [`url_title`].
pub fn anchor_id(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.'))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect::<String>()
        .to_lowercase()
}
