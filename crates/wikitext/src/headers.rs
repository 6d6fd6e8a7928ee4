use crate::escape::anchor_id;

const MAX_LEVEL: usize = 6;

/// `== Title ==` lines become `<h2>`. Leading and trailing runs are matched
/// symmetrically; surplus `=` on the longer side stays in the heading text.
pub fn convert_headers(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        match heading(line) {
            Some((level, inner)) => {
                out.push_str(&format!(
                    "<h{level} id=\"{}\">{inner}</h{level}>",
                    anchor_id(inner)
                ));
            }
            None => out.push_str(line),
        }
    }
    out
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let line = line.trim_end();
    let lead = line.bytes().take_while(|&b| b == b'=').count();
    if lead == 0 || lead == line.len() {
        return None;
    }
    let trail = line.bytes().rev().take_while(|&b| b == b'=').count();
    let level = lead.min(trail).min(MAX_LEVEL);
    if level == 0 {
        return None;
    }
    let inner = line[level..line.len() - level].trim();
    if inner.is_empty() {
        return None;
    }
    Some((level, inner))
}
