//! Comment removal and paragraph wrapping: the first and last passes.

const BLOCK_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "dl", "table", "div", "blockquote", "p",
    "pre", "hr", "center",
];

/// Drops `<!-- ... -->`. An unterminated comment runs to the end of the text.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find("<!--") {
        out.push_str(&rest[..open]);
        match rest[open + 4..].find("-->") {
            Some(close) => rest = &rest[open + 4 + close + 3..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// True when the line opens (or closes) a block-level element.
fn is_block(line: &str) -> bool {
    let Some(tag) = line.strip_prefix('<') else {
        return false;
    };
    let tag = tag.strip_prefix('/').unwrap_or(tag);
    BLOCK_TAGS.iter().any(|b| {
        tag.strip_prefix(b)
            .and_then(|after| after.chars().next())
            .is_some_and(|c| c == '>' || c == ' ' || c == '/')
    })
}

fn flush(para: &mut Vec<&str>, out: &mut Vec<String>) {
    if !para.is_empty() {
        out.push(format!("<p>{}</p>", para.join("\n")));
        para.clear();
    }
}

/// Wraps runs of non-block lines in `<p>`; blank lines and block elements end
/// a paragraph.
pub fn wrap_paragraphs(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut para: Vec<&str> = Vec::new();

    for line in text.lines() {
        let t = line.trim();
        if t.is_empty() {
            flush(&mut para, &mut out);
        } else if is_block(t) {
            flush(&mut para, &mut out);
            out.push(t.to_string());
        } else {
            para.push(t);
        }
    }
    flush(&mut para, &mut out);

    out.join("\n")
}
