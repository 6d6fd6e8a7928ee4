//! Built-in handlers for the most common article templates.

use super::registry::{TemplateCall, TemplateRegistry};
use crate::escape::escape_html;
use crate::links::link_html;
use crate::RenderOptions;

const RANGE_SEPARATORS: &[&str] = &["to", "-", "–", "and", "or", "x", "by"];
const INFOBOX_HIDDEN_KEYS: &[&str] = &["name", "title", "alt", "caption", "embed"];
const INFOBOX_HIDDEN_PREFIXES: &[&str] = &["image", "logo", "map", "pushpin", "coordinates"];

pub(crate) fn register_builtins(r: &mut TemplateRegistry) {
    // Metadata and maintenance banners: nothing to show a reader.
    r.register("short description", silent)
        .register_pattern("use * dates", silent)
        .register_pattern("use * english", silent)
        .register("pp", silent)
        .register_pattern("pp-*", silent)
        .register("good article", silent)
        .register("featured article", silent)
        .register("authority control", silent)
        .register("toc limit", silent)
        .register("flagicon", silent)
        .register_pattern("defaultsort:*", silent)
        .register_pattern("displaytitle:*", silent);

    // Magic words used to escape table syntax inside arguments.
    r.register("!", |_, _| "|".to_string())
        .register("=", |_, _| "=".to_string())
        .register("br", |_, _| "<br>".to_string())
        .register("clear", |_, _| "<div style=\"clear:both\"></div>".to_string());

    r.register("main", hatnote("Main article", "Main articles"))
        .register("main article", hatnote("Main article", "Main articles"))
        .register("see also", hatnote("See also", "See also"))
        .register("further", hatnote("Further information", "Further information"))
        .register("about", about);

    r.register("reflist", reflist)
        .register("references", reflist)
        .register("citation", citation)
        .register_pattern("cite *", citation)
        .register("sfn", sfn)
        .register("citation needed", citation_needed)
        .register("cn", citation_needed)
        .register("fact", citation_needed);

    r.register_pattern("infobox*", infobox);

    r.register("lang", lang)
        .register_pattern("lang-*", lang_code)
        .register("ipa", ipa)
        .register_pattern("ipa*", ipa)
        .register("convert", convert)
        .register("cvt", convert)
        .register("nowrap", nowrap)
        .register("small", small)
        .register("quote", quote)
        .register("blockquote", quote)
        .register("circa", circa)
        .register("c.", circa)
        .register("as of", as_of)
        .register("flag", flag)
        .register("flagcountry", flag);
}

fn silent(_: &TemplateCall, _: &RenderOptions) -> String {
    String::new()
}

/// An argument that is already markup passes through; a bare title is linked.
fn linkify(arg: &str, opts: &RenderOptions) -> String {
    if arg.starts_with('<') {
        arg.to_string()
    } else {
        link_html(arg, &arg.replace('#', " § "), &opts.link_prefix)
    }
}

fn join_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

fn hatnote(
    singular: &'static str,
    plural: &'static str,
) -> impl Fn(&TemplateCall, &RenderOptions) -> String + Send + Sync + 'static {
    move |call: &TemplateCall, opts: &RenderOptions| {
        let links: Vec<String> = call
            .positionals()
            .filter(|t| !t.is_empty())
            .map(|t| linkify(t, opts))
            .collect();
        if links.is_empty() {
            return String::new();
        }
        let label = if links.len() == 1 { singular } else { plural };
        format!("<div class=\"hatnote\">{label}: {}</div>", join_list(&links))
    }
}

fn about(call: &TemplateCall, opts: &RenderOptions) -> String {
    let mut html = String::from("<div class=\"hatnote\">");
    if let Some(topic) = call.positional(0).filter(|t| !t.is_empty()) {
        html.push_str(&format!("This article is about {topic}. "));
    }
    match (call.positional(1), call.positional(2)) {
        (Some(other), Some(target)) if !target.is_empty() => {
            html.push_str(&format!("For {other}, see {}.", linkify(target, opts)));
        }
        _ => html.push_str("For other uses, see the disambiguation page."),
    }
    html.push_str("</div>");
    html
}

fn reflist(_: &TemplateCall, _: &RenderOptions) -> String {
    "<div class=\"reflist\"></div>".to_string()
}

fn citation(call: &TemplateCall, _: &RenderOptions) -> String {
    let mut parts = Vec::new();

    if let Some(author) = call.first_named(&["author", "author1", "last", "last1"]) {
        parts.push(match call.first_named(&["first", "first1"]) {
            Some(first) => format!("{author}, {first}"),
            None => author.to_string(),
        });
    }
    if let Some(title) = call.first_named(&["title"]) {
        let title = match call.first_named(&["url"]) {
            Some(url) => format!(
                "<a class=\"external\" href=\"{}\">{title}</a>",
                escape_html(url)
            ),
            None => title.to_string(),
        };
        parts.push(format!("&quot;{title}&quot;"));
    }
    if let Some(work) = call.first_named(&[
        "website",
        "work",
        "journal",
        "newspaper",
        "magazine",
        "publisher",
    ]) {
        parts.push(format!("<i>{work}</i>"));
    }
    if let Some(date) = call.first_named(&["date", "year"]) {
        parts.push(date.to_string());
    }

    if parts.is_empty() {
        return "<cite class=\"citation\"></cite>".to_string();
    }
    format!("<cite class=\"citation\">{}.</cite>", parts.join(". "))
}

fn sfn(call: &TemplateCall, _: &RenderOptions) -> String {
    let p: Vec<&str> = call.positionals().filter(|s| !s.is_empty()).collect();
    let mut text = match p.split_last() {
        Some((year, [])) => year.to_string(),
        Some((year, authors)) => format!("{} {year}", authors.join(" &amp; ")),
        None => String::new(),
    };
    if let Some(page) = call.first_named(&["p", "page"]) {
        text.push_str(&format!(", p. {page}"));
    } else if let Some(pages) = call.first_named(&["pp", "pages"]) {
        text.push_str(&format!(", pp. {pages}"));
    }
    format!("<sup class=\"reference\">[{text}]</sup>")
}

fn citation_needed(_: &TemplateCall, _: &RenderOptions) -> String {
    "<sup class=\"noprint\">[<i>citation needed</i>]</sup>".to_string()
}

fn infobox(call: &TemplateCall, _: &RenderOptions) -> String {
    let mut html = String::from("<table class=\"infobox\">");
    if let Some(name) = call.first_named(&["name", "title"]) {
        html.push_str(&format!("<caption>{name}</caption>"));
    }
    for (key, value) in call.named_args() {
        let lower = key.to_lowercase();
        if value.is_empty()
            || INFOBOX_HIDDEN_KEYS.contains(&lower.as_str())
            || INFOBOX_HIDDEN_PREFIXES.iter().any(|p| lower.starts_with(p))
        {
            continue;
        }
        let label = key.replace('_', " ");
        html.push_str(&format!("<tr><th>{label}</th><td>{value}</td></tr>"));
    }
    html.push_str("</table>");
    html
}

fn lang(call: &TemplateCall, _: &RenderOptions) -> String {
    let code = call.positional(0).unwrap_or_default();
    let text = call.positional(1).unwrap_or_default();
    format!("<span lang=\"{}\">{text}</span>", escape_html(code))
}

fn lang_code(call: &TemplateCall, _: &RenderOptions) -> String {
    let code = call.name.strip_prefix("lang-").unwrap_or_default();
    let text = call.positional(0).unwrap_or_default();
    format!("<i lang=\"{}\">{text}</i>", escape_html(code))
}

fn ipa(call: &TemplateCall, _: &RenderOptions) -> String {
    let text = if call.name == "ipa" {
        call.positional(0)
    } else {
        call.positionals().filter(|s| !s.is_empty()).last()
    };
    format!("<span class=\"ipa\">[{}]</span>", text.unwrap_or_default())
}

fn convert(call: &TemplateCall, _: &RenderOptions) -> String {
    let p: Vec<&str> = call.positionals().collect();
    match p.as_slice() {
        [from, sep, to, unit, ..] if RANGE_SEPARATORS.contains(sep) => {
            format!("{from} {sep} {to}&nbsp;{unit}")
        }
        [value, unit, ..] => format!("{value}&nbsp;{unit}"),
        [value] => value.to_string(),
        [] => String::new(),
    }
}

fn nowrap(call: &TemplateCall, _: &RenderOptions) -> String {
    format!(
        "<span class=\"nowrap\">{}</span>",
        call.positional(0).unwrap_or_default()
    )
}

fn small(call: &TemplateCall, _: &RenderOptions) -> String {
    format!("<small>{}</small>", call.positional(0).unwrap_or_default())
}

fn quote(call: &TemplateCall, _: &RenderOptions) -> String {
    let text = call
        .first_named(&["text", "quote"])
        .or_else(|| call.positional(0))
        .unwrap_or_default();
    let author = call
        .first_named(&["author", "sign"])
        .or_else(|| call.positional(1))
        .filter(|a| !a.is_empty());
    let source = call
        .first_named(&["source"])
        .or_else(|| call.positional(2))
        .filter(|s| !s.is_empty());

    let mut html = format!("<blockquote><p>{text}</p>");
    match (author, source) {
        (Some(a), Some(s)) => html.push_str(&format!("<footer>{a}, <cite>{s}</cite></footer>")),
        (Some(a), None) => html.push_str(&format!("<footer>{a}</footer>")),
        (None, Some(s)) => html.push_str(&format!("<footer><cite>{s}</cite></footer>")),
        (None, None) => {}
    }
    html.push_str("</blockquote>");
    html
}

fn circa(call: &TemplateCall, _: &RenderOptions) -> String {
    match call.positional(0).filter(|y| !y.is_empty()) {
        Some(year) => format!("<abbr title=\"circa\">c.</abbr>&nbsp;{year}"),
        None => "<abbr title=\"circa\">c.</abbr>".to_string(),
    }
}

fn as_of(call: &TemplateCall, _: &RenderOptions) -> String {
    let date: Vec<&str> = call.positionals().filter(|s| !s.is_empty()).collect();
    format!("As of {}", date.join(" "))
}

fn flag(call: &TemplateCall, _: &RenderOptions) -> String {
    call.positional(1)
        .filter(|s| !s.is_empty())
        .or_else(|| call.positional(0))
        .unwrap_or_default()
        .to_string()
}
