//! `{| ... |}` tables. Each finished table is emitted on a single line so the
//! paragraph stage treats it as one block.

use crate::escape::escape_html;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Header,
    Data,
}

impl CellKind {
    fn tag(self) -> &'static str {
        match self {
            CellKind::Header => "th",
            CellKind::Data => "td",
        }
    }
}

#[derive(Debug)]
struct TableBuilder {
    html: String,
    row_open: bool,
    cell: Option<CellKind>,
}

impl TableBuilder {
    fn open(attrs: &str) -> Self {
        let html = match class_attr(attrs) {
            Some(class) => format!("<table class=\"{}\">", escape_html(class)),
            None => "<table>".to_string(),
        };
        Self {
            html,
            row_open: false,
            cell: None,
        }
    }

    fn close_cell(&mut self) {
        if let Some(kind) = self.cell.take() {
            self.html.push_str(&format!("</{}>", kind.tag()));
        }
    }

    fn close_row(&mut self) {
        self.close_cell();
        if self.row_open {
            self.html.push_str("</tr>");
            self.row_open = false;
        }
    }

    fn caption(&mut self, text: &str) {
        self.close_cell();
        self.html
            .push_str(&format!("<caption>{}</caption>", text.trim()));
    }

    fn cell(&mut self, kind: CellKind, raw: &str) {
        self.close_cell();
        if !self.row_open {
            self.html.push_str("<tr>");
            self.row_open = true;
        }
        let tag = kind.tag();
        self.html
            .push_str(&format!("<{tag}>{}", strip_cell_attrs(raw).trim()));
        self.cell = Some(kind);
    }

    /// A line that does not start a new cell extends the open one.
    fn continue_cell(&mut self, text: &str) {
        if self.cell.is_some() {
            self.html.push(' ');
            self.html.push_str(text);
        }
    }

    fn finish(mut self) -> String {
        self.close_row();
        self.html.push_str("</table>");
        self.html
    }
}

/// The value of a `class="..."` attribute on the table's opening line.
fn class_attr(attrs: &str) -> Option<&str> {
    let rest = &attrs[attrs.find("class=")? + "class=".len()..];
    let value = match rest.chars().next()? {
        q @ ('"' | '\'') => rest[1..].split(q).next()?,
        _ => rest.split_whitespace().next()?,
    };
    (!value.is_empty()).then_some(value)
}

/// `style="..." | content` keeps only the content. Markup on the left means
/// the pipe belongs to the content.
fn strip_cell_attrs(cell: &str) -> &str {
    match cell.split_once('|') {
        Some((attrs, content)) if !attrs.contains(['<', '[', '{']) => content,
        _ => cell,
    }
}

fn split_cells<'a>(line: &'a str, separators: &[&str]) -> Vec<&'a str> {
    let mut cells = vec![line];
    for sep in separators {
        cells = cells.into_iter().flat_map(|c| c.split(sep)).collect();
    }
    cells
}

/// Where a finished table goes: into the open cell of its parent, or out.
fn emit(stack: &mut [TableBuilder], out: &mut Vec<String>, html: String) {
    match stack.last_mut() {
        Some(parent) => parent.html.push_str(&html),
        None => out.push(html),
    }
}

pub fn convert_tables(text: &str) -> String {
    if !text.contains("{|") {
        return text.to_string();
    }

    let mut out: Vec<String> = Vec::new();
    let mut stack: Vec<TableBuilder> = Vec::new();

    for line in text.split('\n') {
        let t = line.trim_start();

        if let Some(attrs) = t.strip_prefix("{|") {
            stack.push(TableBuilder::open(attrs));
            continue;
        }
        if t.starts_with("|}") {
            if let Some(done) = stack.pop() {
                let html = done.finish();
                emit(&mut stack, &mut out, html);
                continue;
            }
        }

        let Some(table) = stack.last_mut() else {
            out.push(line.to_string());
            continue;
        };

        if let Some(caption) = t.strip_prefix("|+") {
            table.caption(caption);
        } else if t.starts_with("|-") {
            table.close_row();
        } else if let Some(rest) = t.strip_prefix('!') {
            for cell in split_cells(rest, &["!!", "||"]) {
                table.cell(CellKind::Header, cell);
            }
        } else if let Some(rest) = t.strip_prefix('|') {
            for cell in split_cells(rest, &["||"]) {
                table.cell(CellKind::Data, cell);
            }
        } else if !t.is_empty() {
            table.continue_cell(t.trim_end());
        }
    }

    // Unterminated tables close at the end of the text.
    while let Some(done) = stack.pop() {
        let html = done.finish();
        emit(&mut stack, &mut out, html);
    }

    out.join("\n")
}
