//! Wikitext to HTML.
//!
//! [`Converter`] runs a fixed sequence of single-pass stages over the page
//! text: comments, headings, emphasis, lists, links, templates, tables and
//! paragraphs. Later stages see the output of earlier ones. Conversion never
//! fails; markup it cannot resolve is rendered as a visible diagnostic.

pub mod emphasis;
pub mod error;
pub mod escape;
pub mod headers;
pub mod links;
pub mod lists;
pub mod paragraphs;
pub mod tables;
pub mod templates;

use std::time::Instant;

use tracing::debug;

pub use error::{MarkupError, Result};
pub use templates::registry::{normalize_name, HandlerFn, NamePattern, TemplateCall, TemplateRegistry};

use emphasis::convert_emphasis;
use escape::escape_html;
use headers::convert_headers;
use links::{convert_links, link_html};
use lists::convert_lists;
use paragraphs::{strip_comments, wrap_paragraphs};
use tables::convert_tables;
use templates::Expander;

pub const DEFAULT_LINK_PREFIX: &str = "/wiki/";
pub const DEFAULT_MAX_DEPTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Prepended to every internal link target
    pub link_prefix: String,
    /// Template nesting limit
    pub max_depth: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            link_prefix: DEFAULT_LINK_PREFIX.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Result of rendering one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub html: String,
    /// `[[Category:...]]` names found in the page
    pub categories: Vec<String>,
    /// Set when the page is a `#REDIRECT`
    pub redirect: Option<String>,
}

/// Target title of a `#REDIRECT [[Target]]` page, without label or fragment.
pub fn redirect_target(text: &str) -> Option<String> {
    let head = text.trim_start();
    let keyword = head.get(..9)?;
    if !keyword.eq_ignore_ascii_case("#redirect") {
        return None;
    }
    let rest = head[9..].trim_start_matches(|c: char| c.is_whitespace() || c == ':');
    let body = rest.strip_prefix("[[")?;
    let inner = &body[..body.find("]]")?];
    let target = inner.split('|').next()?.split('#').next()?.trim();
    (!target.is_empty()).then(|| target.to_string())
}

/// Renders wikitext with a shared, read-only [`TemplateRegistry`].
#[derive(Debug, Clone)]
pub struct Converter<'r> {
    registry: &'r TemplateRegistry,
    options: RenderOptions,
}

impl<'r> Converter<'r> {
    pub fn new(registry: &'r TemplateRegistry) -> Self {
        Self::with_options(registry, RenderOptions::default())
    }

    pub fn with_options(registry: &'r TemplateRegistry, options: RenderOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// HTML for `text`.
    pub fn convert(&self, text: &str) -> String {
        self.render(text).html
    }

    pub fn render(&self, text: &str) -> Rendered {
        let started = Instant::now();
        let text = strip_comments(text);

        if let Some(target) = redirect_target(&text) {
            let html = format!(
                "<div class=\"redirect\">Redirect to {}</div>",
                link_html(&target, &escape_html(&target), &self.options.link_prefix)
            );
            return Rendered {
                html,
                categories: convert_links(&text, &self.options.link_prefix).categories,
                redirect: Some(target),
            };
        }

        let t = convert_headers(&text);
        let t = convert_emphasis(&t);
        let t = convert_lists(&t);
        let links = convert_links(&t, &self.options.link_prefix);
        let t = Expander::new(self.registry, &self.options).expand_top(&links.html);
        let t = convert_tables(&t);
        let html = wrap_paragraphs(&t);

        debug!(
            bytes_in = text.len(),
            bytes_out = html.len(),
            categories = links.categories.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "converted page"
        );

        Rendered {
            html,
            categories: links.categories,
            redirect: None,
        }
    }
}
