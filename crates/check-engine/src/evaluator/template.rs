//! Minimal message template language
//!
//! A template is literal text interleaved with actions such as
//! `{{.Value}}` or `{{.Items "node"}}`. An action names a helper on the
//! render context and passes zero or more quoted string arguments.

use crate::error::TemplateError;

/// Functions an action can call
pub trait TemplateHelpers {
    fn call(&self, helper: &str, args: &[String]) -> Result<String, TemplateError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Action { helper: String, args: Vec<String> },
}

/// A parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Text(rest[..start].to_string()));
            }
            let body_offset = offset + start + 2;
            let (action, consumed) = parse_action(&rest[start + 2..], body_offset)?;
            segments.push(action);
            rest = &rest[start + 2 + consumed..];
            offset = body_offset + consumed;
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        Ok(Self { segments })
    }

    pub fn render(&self, helpers: &dyn TemplateHelpers) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Action { helper, args } => out.push_str(&helpers.call(helper, args)?),
            }
        }
        Ok(out)
    }
}

/// Parse one action body following `{{`; returns the segment and the
/// number of bytes consumed including the closing `}}`.
fn parse_action(body: &str, base: usize) -> Result<(Segment, usize), TemplateError> {
    let err = |pos: usize, reason: &str| TemplateError::Parse {
        offset: base + pos,
        reason: reason.to_string(),
    };

    let mut pos = skip_whitespace(body, 0);
    if body[pos..].starts_with("}}") {
        return Err(err(pos, "missing value for command"));
    }
    if !body[pos..].starts_with('.') {
        return Err(err(pos, "expected helper reference starting with '.'"));
    }
    pos += 1;

    let name_len = body[pos..]
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(body.len() - pos);
    if name_len == 0 {
        return Err(err(pos, "missing helper name"));
    }
    let helper = body[pos..pos + name_len].to_string();
    pos += name_len;

    let mut args = Vec::new();
    loop {
        pos = skip_whitespace(body, pos);
        let rest = &body[pos..];
        if rest.is_empty() {
            return Err(err(pos, "unclosed action"));
        }
        if rest.starts_with("}}") {
            return Ok((Segment::Action { helper, args }, pos + 2));
        }
        if rest.starts_with('"') {
            let (arg, len) = parse_string(rest).ok_or_else(|| err(pos, "unterminated quoted string"))?;
            args.push(arg);
            pos += len;
            continue;
        }
        let unexpected = rest.chars().next().unwrap_or_default();
        return Err(err(pos, &format!("unexpected {:?} in action", unexpected)));
    }
}

fn skip_whitespace(s: &str, from: usize) -> usize {
    s[from..]
        .find(|c: char| !c.is_whitespace())
        .map(|i| from + i)
        .unwrap_or(s.len())
}

/// Parse a double-quoted literal at the start of `s`
fn parse_string(s: &str) -> Option<(String, usize)> {
    let mut out = String::new();
    let mut chars = s.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((out, i + 1)),
            '\\' => {
                let (_, escaped) = chars.next()?;
                out.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                });
            }
            '\n' => return None,
            other => out.push(other),
        }
    }
    None
}
