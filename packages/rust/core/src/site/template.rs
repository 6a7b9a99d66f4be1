//! Placeholder tokens and positional formatting.

use std::sync::LazyLock;

use regex::Regex;

use docsite_shared::{DocsiteError, Result};

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%%%([A-Z]+)%%%").expect("valid regex"));

/// A placeholder recognized in page templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Token {
    TocFile,
    Header,
    SideMenu,
    Context,
}

impl Token {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "TOCFILE" => Some(Self::TocFile),
            "HEADER" => Some(Self::Header),
            "SIDEMENU" => Some(Self::SideMenu),
            "CONTEXT" => Some(Self::Context),
            _ => None,
        }
    }
}

/// Replace every known token in `input` in a single left-to-right pass.
///
/// `value` is called at most once per distinct token; returning `None`
/// leaves that token in place, as are unknown tokens. Substituted values
/// are never scanned for tokens again.
pub fn replace_tokens<F>(input: &str, mut value: F) -> Result<String>
where
    F: FnMut(Token) -> Result<Option<String>>,
{
    let mut cache: Vec<(Token, Option<String>)> = Vec::new();
    let mut out = String::with_capacity(input.len());
    let mut last = 0;

    for caps in TOKEN_RE.captures_iter(input) {
        let Some(whole) = caps.get(0) else { continue };
        let Some(token) = Token::from_name(&caps[1]) else {
            continue;
        };

        let cached = match cache.iter().find(|(t, _)| *t == token) {
            Some((_, v)) => v.clone(),
            None => {
                let v = value(token)?;
                cache.push((token, v.clone()));
                v
            }
        };

        if let Some(replacement) = cached {
            out.push_str(&input[last..whole.start()]);
            out.push_str(&replacement);
            last = whole.end();
        }
    }
    out.push_str(&input[last..]);
    Ok(out)
}

/// Substitute `{0}`, `{1}`, … with `args`; `{{` and `}}` are literal braces.
pub fn format_positional(template: &str, args: &[&str]) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' if chars.peek().is_some_and(|(_, n)| *n == '{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek().is_some_and(|(_, n)| *n == '}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let rest = &template[pos + 1..];
                let end = rest.find('}').ok_or_else(|| {
                    DocsiteError::Template(format!("unmatched '{{' at byte {pos}"))
                })?;
                let field = &rest[..end];
                let index: usize = field.parse().map_err(|_| {
                    DocsiteError::Template(format!("unsupported field '{{{field}}}'"))
                })?;
                let arg = args.get(index).ok_or_else(|| {
                    DocsiteError::Template(format!(
                        "field {{{index}}} out of range ({} arguments)",
                        args.len()
                    ))
                })?;
                out.push_str(arg);
                for _ in 0..=end {
                    chars.next();
                }
            }
            '}' => {
                return Err(DocsiteError::Template(format!(
                    "single '}}' at byte {pos}"
                )));
            }
            c => out.push(c),
        }
    }
    Ok(out)
}
