#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Bold,
    Italic,
}

impl Style {
    fn open(self) -> &'static str {
        match self {
            Style::Bold => "<b>",
            Style::Italic => "<i>",
        }
    }

    fn close(self) -> &'static str {
        match self {
            Style::Bold => "</b>",
            Style::Italic => "</i>",
        }
    }
}

/// Quote runs, longest first: 5+ toggle bold+italic, 3 bold, 2 italic.
/// Emphasis never spans lines; anything left open is closed at end of line.
pub fn convert_emphasis(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 32);
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        emphasize_line(line, &mut out);
    }
    out
}

fn emphasize_line(line: &str, out: &mut String) {
    if !line.contains("''") {
        out.push_str(line);
        return;
    }

    let bytes = line.as_bytes();
    let mut stack: Vec<Style> = Vec::with_capacity(2);
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'\'' {
            i += 1;
            continue;
        }
        let run_start = i;
        while i < bytes.len() && bytes[i] == b'\'' {
            i += 1;
        }
        let run = i - run_start;
        if run < 2 {
            continue;
        }

        out.push_str(&line[last..run_start]);
        // A run of 4 is an apostrophe followed by bold; 6+ keeps the surplus.
        let literal = match run {
            2 | 3 => 0,
            4 => 1,
            n => n - 5,
        };
        for _ in 0..literal {
            out.push('\'');
        }
        match run {
            2 => toggle(&mut stack, Style::Italic, out),
            3 | 4 => toggle(&mut stack, Style::Bold, out),
            _ => toggle_both(&mut stack, out),
        }
        last = i;
    }

    out.push_str(&line[last..]);
    while let Some(s) = stack.pop() {
        out.push_str(s.close());
    }
}

fn toggle(stack: &mut Vec<Style>, style: Style, out: &mut String) {
    let Some(pos) = stack.iter().rposition(|&s| s == style) else {
        out.push_str(style.open());
        stack.push(style);
        return;
    };
    // Keep tags properly nested: close what sits above, then reopen it.
    let above: Vec<Style> = stack.drain(pos + 1..).collect();
    for s in above.iter().rev() {
        out.push_str(s.close());
    }
    out.push_str(style.close());
    stack.pop();
    for s in above {
        out.push_str(s.open());
        stack.push(s);
    }
}

fn toggle_both(stack: &mut Vec<Style>, out: &mut String) {
    let bold = stack.contains(&Style::Bold);
    let italic = stack.contains(&Style::Italic);
    match (bold, italic) {
        (false, false) => {
            toggle(stack, Style::Bold, out);
            toggle(stack, Style::Italic, out);
        }
        (true, true) => {
            while let Some(s) = stack.pop() {
                out.push_str(s.close());
            }
        }
        (true, false) => {
            toggle(stack, Style::Bold, out);
            toggle(stack, Style::Italic, out);
        }
        (false, true) => {
            toggle(stack, Style::Italic, out);
            toggle(stack, Style::Bold, out);
        }
    }
}
