//! URL template resolution.
//!
//! Templates name their path placeholders either as `{name}` anywhere in the
//! path or as a whole `/:name` segment. Every placeholder must have a value;
//! resolution fails before any request is built otherwise.

use std::collections::BTreeMap;

use crate::error::{Error, InvalidInputError};

/// A template token: literal text or a named placeholder.
#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn tokenize(template: &str) -> Result<Vec<Token<'_>>, Error> {
    let malformed = |reason: &str| -> Error {
        InvalidInputError::Template {
            template: template.to_string(),
            reason: reason.to_string(),
        }
        .into()
    };

    // Placeholders only live in the path, never in a literal query string.
    let path_end = template.find('?').unwrap_or(template.len());

    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut chars = template[..path_end].char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '{' => {
                let close = template[i..path_end]
                    .find('}')
                    .map(|offset| i + offset)
                    .ok_or_else(|| malformed("unclosed '{'"))?;
                let name = &template[i + 1..close];
                if name.is_empty() || !name.chars().all(is_ident) {
                    return Err(malformed("placeholder names must be identifiers"));
                }
                if literal_start < i {
                    tokens.push(Token::Literal(&template[literal_start..i]));
                }
                tokens.push(Token::Placeholder(name));
                literal_start = close + 1;
                while chars.peek().is_some_and(|&(j, _)| j <= close) {
                    chars.next();
                }
            }
            '}' => return Err(malformed("unmatched '}'")),
            ':' if template[..i].ends_with('/')
                && chars.peek().is_some_and(|&(_, next)| is_ident_start(next)) =>
            {
                let mut end = i + 1;
                while let Some(&(j, next)) = chars.peek() {
                    if !is_ident(next) {
                        break;
                    }
                    end = j + next.len_utf8();
                    chars.next();
                }
                if literal_start < i {
                    tokens.push(Token::Literal(&template[literal_start..i]));
                }
                tokens.push(Token::Placeholder(&template[i + 1..end]));
                literal_start = end;
            }
            _ => {}
        }
    }

    if literal_start < template.len() {
        tokens.push(Token::Literal(&template[literal_start..]));
    }

    Ok(tokens)
}

/// Returns the placeholder names of a template, in order of appearance.
///
/// # Errors
///
/// Returns an error if the template is malformed.
pub fn placeholders(template: &str) -> Result<Vec<&str>, Error> {
    Ok(tokenize(template)?
        .into_iter()
        .filter_map(|token| match token {
            Token::Placeholder(name) => Some(name),
            Token::Literal(_) => None,
        })
        .collect())
}

/// Substitutes every placeholder in `template` with its value from `vars`.
///
/// Variables that no placeholder refers to are ignored.
///
/// # Errors
///
/// Returns [`InvalidInputError::UnresolvedPlaceholder`] for the first
/// placeholder without a value.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use authfetch_core::types::resolve_template;
///
/// let mut vars = BTreeMap::new();
/// vars.insert("id".to_string(), "7".to_string());
/// vars.insert("orderId".to_string(), "42".to_string());
///
/// let path = resolve_template("/users/{id}/orders/{orderId}", &vars).unwrap();
/// assert_eq!(path, "/users/7/orders/42");
/// ```
pub fn resolve_template(template: &str, vars: &BTreeMap<String, String>) -> Result<String, Error> {
    let mut resolved = String::with_capacity(template.len());

    for token in tokenize(template)? {
        match token {
            Token::Literal(text) => resolved.push_str(text),
            Token::Placeholder(name) => {
                let value = vars.get(name).ok_or_else(|| {
                    Error::from(InvalidInputError::UnresolvedPlaceholder {
                        template: template.to_string(),
                        name: name.to_string(),
                    })
                })?;
                resolved.push_str(value);
            }
        }
    }

    Ok(resolved)
}
