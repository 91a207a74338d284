use crate::constants::DEFAULT_PARAM_TYPE;
use crate::helpers;
use crate::route::ParamInfo;
use crate::Error;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PARAM_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// One run of a route pattern: literal text, or a single parameter.
#[derive(Debug, Clone)]
pub(crate) enum Piece {
    Static(String),
    Param(ParamInfo),
}

/// A validated route pattern, split into pieces.
#[derive(Debug, Clone)]
pub(crate) struct Pattern {
    pub(crate) raw: String,
    pub(crate) pieces: Vec<Piece>,
}

impl Pattern {
    /// Parses `pattern`, compiling every parameter constraint exactly once.
    pub(crate) fn parse(pattern: &str) -> crate::Result<Pattern> {
        if !pattern.starts_with('/') {
            return Err(invalid(pattern, "pattern should start with '/'"));
        }
        let raw = helpers::trim_trailing_slash(pattern).to_owned();

        let mut pieces = Vec::new();
        let mut rest = raw.as_str();
        while !rest.is_empty() {
            if rest.starts_with('{') {
                let (info, after) = parse_param(&raw, rest)?;
                pieces.push(Piece::Param(info));
                rest = after;
            } else {
                let end = rest.find('{').unwrap_or(rest.len());
                let (text, after) = rest.split_at(end);
                if !after.is_empty() && !text.ends_with('/') {
                    return Err(invalid(&raw, "'{' should be after '/'"));
                }
                if text.contains('}') {
                    return Err(invalid(&raw, "unexpected '}'"));
                }
                pieces.push(Piece::Static(text.to_owned()));
                rest = after;
            }
        }

        Ok(Pattern { raw, pieces })
    }

    /// The pattern rendered with bare parameter names, e.g. `/users/{id}`.
    pub(crate) fn render(&self) -> String {
        let mut out = String::with_capacity(self.raw.len());
        for piece in &self.pieces {
            match piece {
                Piece::Static(text) => out.push_str(text),
                Piece::Param(info) => out.push_str(&info.segment()),
            }
        }
        out
    }

    pub(crate) fn params(&self) -> Vec<ParamInfo> {
        self.pieces
            .iter()
            .filter_map(|piece| match piece {
                Piece::Param(info) => Some(info.clone()),
                Piece::Static(_) => None,
            })
            .collect()
    }
}

/// Parses the parameter at the start of `rest` (which begins with `{`) and
/// returns it with the remainder of the pattern.
fn parse_param<'a>(pattern: &str, rest: &'a str) -> crate::Result<(ParamInfo, &'a str)> {
    let close = find_closing_brace(rest).ok_or_else(|| invalid(pattern, "missing '}'"))?;
    let body = &rest[1..close];
    let after = &rest[close + 1..];
    if !after.is_empty() && !after.starts_with('/') {
        return Err(invalid(pattern, "'}' should be before '/' or at the end"));
    }

    if let Some(name) = body.strip_prefix('*') {
        validate_name(pattern, name)?;
        if !after.is_empty() {
            return Err(invalid(pattern, "catch-all parameter must be the last part of the pattern"));
        }
        return Ok((ParamInfo::catch_all(name), after));
    }

    let mut fields = body.splitn(4, ':');
    let name = fields.next().unwrap_or_default();
    validate_name(pattern, name)?;

    let constraint = fields.next().filter(|f| !f.is_empty());
    let regex = match constraint {
        Some(src) => Some(Regex::new(&format!("^(?:{})$", src)).map_err(|source| Error::InvalidRegex {
            pattern: pattern.to_owned(),
            name: name.to_owned(),
            source,
        })?),
        None => None,
    };
    let data_type = fields
        .next()
        .filter(|f| !f.is_empty())
        .unwrap_or(DEFAULT_PARAM_TYPE);
    let description = fields.next().unwrap_or_default();

    let info = ParamInfo {
        name: name.to_owned(),
        pattern: constraint.map(str::to_owned),
        regex,
        data_type: data_type.to_owned(),
        description: description.to_owned(),
        catch_all: false,
    };
    Ok((info, after))
}

/// Index of the `}` closing the `{` at index 0, honouring nested braces such
/// as regex repetition counts.
fn find_closing_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in s.bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn validate_name(pattern: &str, name: &str) -> crate::Result<()> {
    if name.is_empty() {
        return Err(invalid(pattern, "empty param name"));
    }
    if !PARAM_NAME.is_match(name) {
        return Err(invalid(pattern, &format!("invalid param name `{}`", name)));
    }
    Ok(())
}

fn invalid(pattern: &str, reason: &str) -> Error {
    Error::InvalidPattern {
        pattern: pattern.to_owned(),
        reason: reason.to_owned(),
    }
}
