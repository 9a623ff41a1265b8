//! Free-text signature parsing (`def f(self, a: int, b) -> str`, `fn f(a: u8) -> bool`, ...).

use std::sync::OnceLock;

use regex::Regex;

use crate::model::{Parameter, Signature};

const RECEIVERS: &[&str] = &["self", "cls", "&self", "&mut self", "mut self", "this"];

fn returns_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"->\s*([a-zA-Z0-9_\[\],\.]+)").expect("valid returns regex"))
}

fn params_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\((.*)\)").expect("valid params regex"))
}

fn typed_param_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([a-zA-Z_][a-zA-Z0-9_]*)\s*:\s*([^=]+)").expect("valid param regex")
    })
}

/// Parse a one-line signature into parameters and an optional return type.
///
/// The parameter list is the outermost parenthesized group, split on commas
/// that are not nested inside brackets. Receivers (`self`, `cls`, ...) are dropped.
pub fn parse_signature(text: &str) -> Signature {
    let returns = returns_re().captures(text).map(|c| c[1].trim().to_string());

    let parameters = params_re()
        .captures(text)
        .map(|c| split_top_level(&c[1]).into_iter().filter_map(parse_parameter).collect())
        .unwrap_or_default();

    Signature { parameters, returns }
}

fn parse_parameter(raw: &str) -> Option<Parameter> {
    let raw = raw.trim();
    if raw.is_empty() || RECEIVERS.contains(&raw) {
        return None;
    }
    let param = match typed_param_re().captures(raw) {
        Some(c) => Parameter {
            name: c[1].trim().to_string(),
            ty: Some(c[2].trim().to_string()).filter(|t| !t.is_empty()),
            description: None,
        },
        None => {
            let name = raw.split('=').next().unwrap_or(raw).trim();
            Parameter::named(name)
        }
    };
    if param.name.is_empty() || RECEIVERS.contains(&param.name.as_str()) {
        return None;
    }
    Some(param)
}

fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (idx, c) in list.char_indices() {
        match c {
            '(' | '[' | '{' | '<' => depth += 1,
            ')' | ']' | '}' | '>' => depth = (depth - 1).max(0),
            ',' if depth == 0 => {
                parts.push(&list[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
}
