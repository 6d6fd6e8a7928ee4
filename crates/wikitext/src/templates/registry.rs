use std::fmt;

use crate::RenderOptions;

/// A resolved invocation as handed to a handler: arguments are fully expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateCall {
    /// Normalized name: trimmed, lowercase, underscores read as spaces
    pub name: String,
    pub args: Vec<String>,
}

impl TemplateCall {
    /// The `n`th unnamed argument (0-based), trimmed.
    pub fn positional(&self, n: usize) -> Option<&str> {
        self.positionals().nth(n)
    }

    pub fn positionals(&self) -> impl Iterator<Item = &str> {
        self.args
            .iter()
            .filter(|a| split_named(a).is_none())
            .map(|a| a.trim())
    }

    /// Value of `key = value`, matched case-insensitively, trimmed.
    pub fn named(&self, key: &str) -> Option<&str> {
        self.named_args()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// First non-empty value among `keys`.
    pub fn first_named(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|k| self.named(k))
            .find(|v| !v.is_empty())
    }

    pub fn named_args(&self) -> impl Iterator<Item = (&str, &str)> {
        self.args.iter().filter_map(|a| split_named(a))
    }
}

/// `key = value` when the key part is a plain name, not markup that happens
/// to contain `=` (an expanded `<a href="...">`, for instance).
fn split_named(arg: &str) -> Option<(&str, &str)> {
    let (k, v) = arg.split_once('=')?;
    let k = k.trim();
    if k.is_empty() || k.contains(['<', '>', '"', '\n', '{', '[']) {
        return None;
    }
    Some((k, v.trim()))
}

/// Canonical handler lookup key for a template name.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub type HandlerFn = dyn Fn(&TemplateCall, &RenderOptions) -> String + Send + Sync;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePattern {
    Exact(String),
    /// `*` matches any run of characters
    Glob(String),
}

impl NamePattern {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Exact(n) => n == name,
            NamePattern::Glob(p) => glob_match(p, name),
        }
    }
}

fn glob_match(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let n: Vec<char> = name.chars().collect();
    let (mut pi, mut ni) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ni < n.len() {
        if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ni));
            pi += 1;
        } else if pi < p.len() && p[pi] == n[ni] {
            pi += 1;
            ni += 1;
        } else if let Some((sp, sn)) = star {
            // Let the last star swallow one more character.
            pi = sp + 1;
            ni = sn + 1;
            star = Some((sp, sn + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}

/// Ordered name/pattern → handler bindings. First registered match wins.
///
/// Build it once at startup and share it by reference; it is never mutated
/// while rendering.
pub struct TemplateRegistry {
    handlers: Vec<(NamePattern, Box<HandlerFn>)>,
}

impl TemplateRegistry {
    /// An empty registry; every template renders as unresolved.
    pub fn empty() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// The built-in handler set.
    pub fn with_builtins() -> Self {
        let mut r = Self::empty();
        super::builtin::register_builtins(&mut r);
        r
    }

    pub fn register<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&TemplateCall, &RenderOptions) -> String + Send + Sync + 'static,
    {
        self.handlers
            .push((NamePattern::Exact(normalize_name(name)), Box::new(f)));
        self
    }

    pub fn register_pattern<F>(&mut self, pattern: &str, f: F) -> &mut Self
    where
        F: Fn(&TemplateCall, &RenderOptions) -> String + Send + Sync + 'static,
    {
        self.handlers
            .push((NamePattern::Glob(normalize_name(pattern)), Box::new(f)));
        self
    }

    /// Handler for an already normalized name.
    pub fn resolve(&self, name: &str) -> Option<&HandlerFn> {
        self.handlers
            .iter()
            .find(|(p, _)| p.matches(name))
            .map(|(_, h)| h.as_ref())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|(p, _)| p))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(args: &[&str]) -> TemplateCall {
        TemplateCall {
            name: "t".to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Citation_needed "), "citation needed");
        assert_eq!(normalize_name("Infobox   settlement"), "infobox settlement");
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("infobox*", "infobox"));
        assert!(glob_match("infobox*", "infobox settlement"));
        assert!(glob_match("use * dates", "use dmy dates"));
        assert!(glob_match("*", ""));
        assert!(!glob_match("use * dates", "use dmy"));
        assert!(!glob_match("lang-*", "lang"));
    }

    #[test]
    fn test_first_registration_wins() {
        let mut r = TemplateRegistry::empty();
        r.register_pattern("cite *", |_, _| "generic".to_string())
            .register("Cite web", |_, _| "specific".to_string());

        let h = r.resolve("cite web").unwrap();
        assert_eq!(h(&call(&[]), &RenderOptions::default()), "generic");
        assert!(r.resolve("citation").is_none());
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn test_positional_and_named_args() {
        let c = call(&[" Paris ", "title = Eiffel", "<a href=\"/wiki/X\">X</a>", "year=1889"]);
        assert_eq!(c.positional(0), Some("Paris"));
        assert_eq!(c.positional(1), Some("<a href=\"/wiki/X\">X</a>"));
        assert_eq!(c.positional(2), None);
        assert_eq!(c.named("Title"), Some("Eiffel"));
        assert_eq!(c.first_named(&["author", "year"]), Some("1889"));
    }
}
