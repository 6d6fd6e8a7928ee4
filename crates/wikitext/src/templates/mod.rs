//! `{{template}}` expansion.
//!
//! Invocations are located with a brace-depth scanner, split on top-level
//! pipes, and expanded innermost first: every argument is fully rendered
//! before the enclosing handler sees it.

mod builtin;
pub mod registry;
pub mod scan;

use tracing::debug;

use crate::error::{MarkupError, Result};
use crate::escape::escape_html;
use crate::RenderOptions;
use registry::{normalize_name, TemplateCall, TemplateRegistry};
use scan::{find_invocations, split_args};

pub(crate) struct Expander<'a> {
    registry: &'a TemplateRegistry,
    options: &'a RenderOptions,
}

impl<'a> Expander<'a> {
    pub(crate) fn new(registry: &'a TemplateRegistry, options: &'a RenderOptions) -> Self {
        Self { registry, options }
    }

    /// Expands every top-level invocation. A span nested too deeply becomes a
    /// `template-depth` diagnostic; the rest of the text is unaffected.
    pub(crate) fn expand_top(&self, text: &str) -> String {
        self.splice(text, |raw| match self.resolve(raw, 1) {
            Ok(html) => Ok(html),
            Err(err @ MarkupError::DepthExceeded { .. }) => {
                debug!(error = %err, "template expansion aborted");
                Ok(depth_diagnostic(raw))
            }
        })
        .unwrap_or_else(|_| text.to_string())
    }

    fn expand(&self, text: &str, depth: usize) -> Result<String> {
        self.splice(text, |raw| self.resolve(raw, depth))
    }

    /// Replaces each invocation span with its rendering, in place.
    fn splice<F>(&self, text: &str, mut render: F) -> Result<String>
    where
        F: FnMut(&str) -> Result<String>,
    {
        let spans = find_invocations(text);
        if spans.is_empty() {
            return Ok(text.to_string());
        }

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for span in spans {
            out.push_str(&text[cursor..span.start]);
            out.push_str(&render(&text[span.clone()])?);
            cursor = span.end;
        }
        out.push_str(&text[cursor..]);
        Ok(out)
    }

    fn resolve(&self, raw: &str, depth: usize) -> Result<String> {
        if depth > self.options.max_depth {
            return Err(MarkupError::DepthExceeded {
                limit: self.options.max_depth,
            });
        }

        let inner = &raw[2..raw.len() - 2];
        let mut parts = split_args(inner)
            .into_iter()
            .map(|part| self.expand(part, depth + 1))
            .collect::<Result<Vec<_>>>()?;

        let name = normalize_name(&parts.remove(0));
        let Some(handler) = self.registry.resolve(&name) else {
            debug!(template = %name, "unresolved template");
            return Ok(unknown_diagnostic(raw));
        };

        let call = TemplateCall { name, args: parts };
        Ok(handler(&call, self.options))
    }
}

fn diagnostic_text(raw: &str) -> String {
    escape_html(raw).replace('\n', "&#10;")
}

fn unknown_diagnostic(raw: &str) -> String {
    format!(
        "<span class=\"template-unknown\" style=\"color:#d33\" \
         title=\"Unresolved template\">{}</span>",
        diagnostic_text(raw)
    )
}

fn depth_diagnostic(raw: &str) -> String {
    format!(
        "<span class=\"template-depth\" style=\"color:#d33\" \
         title=\"Template nesting too deep\">{}</span>",
        diagnostic_text(raw)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn expand_with(registry: &TemplateRegistry, text: &str) -> String {
        let options = RenderOptions::default();
        Expander::new(registry, &options).expand_top(text)
    }

    #[test]
    fn test_inner_resolves_before_outer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut r = TemplateRegistry::empty();
        let log = Arc::clone(&seen);
        r.register("inner", move |c, _| {
            log.lock().unwrap().push(c.name.clone());
            "INNER".to_string()
        });
        let log = Arc::clone(&seen);
        r.register("outer", move |c, _| {
            log.lock().unwrap().push(c.name.clone());
            format!("OUTER({})", c.positional(0).unwrap_or_default())
        });

        assert_eq!(expand_with(&r, "a {{outer|{{inner}}}} b"), "a OUTER(INNER) b");
        assert_eq!(*seen.lock().unwrap(), vec!["inner", "outer"]);
    }

    #[test]
    fn test_unknown_template_is_kept_visible() {
        let r = TemplateRegistry::empty();
        let html = expand_with(&r, "x {{notreal|<b>}} y");
        assert!(html.starts_with("x <span class=\"template-unknown\""));
        assert!(html.contains("{{notreal|&lt;b&gt;}}"));
        assert!(html.ends_with("</span> y"));
    }

    #[test]
    fn test_each_span_replaces_its_own_occurrence() {
        let mut r = TemplateRegistry::empty();
        let count = Arc::new(Mutex::new(0));
        let c = Arc::clone(&count);
        r.register("n", move |_, _| {
            let mut n = c.lock().unwrap();
            *n += 1;
            n.to_string()
        });
        assert_eq!(expand_with(&r, "{{n}} {{n}} {{n}}"), "1 2 3");
    }

    #[test]
    fn test_depth_limit_renders_diagnostic() {
        let mut r = TemplateRegistry::empty();
        r.register("a", |c, _| c.positional(0).unwrap_or_default().to_string());

        let nest = |n: usize| format!("{}x{}", "{{a|".repeat(n), "}}".repeat(n));

        assert_eq!(expand_with(&r, &nest(10)), "x");

        let html = expand_with(&r, &format!("before {} after", nest(45)));
        assert!(html.starts_with("before <span class=\"template-depth\""));
        assert!(html.ends_with("</span> after"));
    }

    #[test]
    fn test_unterminated_span_stays_literal() {
        let r = TemplateRegistry::with_builtins();
        assert_eq!(expand_with(&r, "{{cn"), "{{cn");
        assert_eq!(expand_with(&r, "a{{!}}b"), "a|b");
    }
}
