use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::config::CategoryCode;
use crate::constants::invalid_value;

/// Case applied to a value before it is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Keep,
    Upper,
    /// First character upper-cased, the rest lower-cased
    Capitalize,
}

impl Case {
    pub fn apply(self, value: &str) -> String {
        match self {
            Case::Keep => value.to_string(),
            Case::Upper => value.to_uppercase(),
            Case::Capitalize => {
                let mut chars = value.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                    None => String::new(),
                }
            }
        }
    }
}

/// Outcome of validating one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checked {
    Valid(String),
    /// Carries the text that failed, for the invalid marker
    Invalid(String),
}

impl Checked {
    pub fn is_valid(&self) -> bool {
        matches!(self, Checked::Valid(_))
    }

    /// Text written back into the tree
    pub fn into_text(self) -> String {
        match self {
            Checked::Valid(value) => value,
            Checked::Invalid(raw) => invalid_value(&raw),
        }
    }
}

/// Accept `value` when it parses with `pattern` once `/` separators become `-`.
///
/// chrono reads `%Y` from one to four digits, so the value must also have
/// the pattern's shape: four-digit years, one or two digits for the rest.
pub fn to_date(value: &str, pattern: &str) -> Checked {
    let normalized = value.replace('/', "-");
    let pattern = pattern.replace('/', "-");
    let parses = NaiveDate::parse_from_str(&normalized, &pattern).is_ok()
        || NaiveDateTime::parse_from_str(&normalized, &pattern).is_ok();
    if parses && has_shape(&normalized, &pattern) {
        Checked::Valid(normalized)
    } else {
        Checked::Invalid(value.to_string())
    }
}

fn has_shape(value: &str, pattern: &str) -> bool {
    match Regex::new(&shape_of(pattern)) {
        Ok(shape) => shape.is_match(value),
        Err(_) => false,
    }
}

/// Anchored regex matching the digit widths a `strftime` pattern allows
fn shape_of(pattern: &str) -> String {
    let mut shape = String::from("^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            shape.push_str(&regex::escape(&c.to_string()));
            continue;
        }
        match chars.next() {
            Some('Y') => shape.push_str(r"\d{4}"),
            Some('y') => shape.push_str(r"\d{2}"),
            Some('m' | 'd' | 'H' | 'M' | 'S' | 'I') => shape.push_str(r"\d{1,2}"),
            Some('%') => shape.push('%'),
            Some(_) => shape.push_str(".+?"),
            None => {}
        }
    }
    shape.push('$');
    shape
}

/// Resolve `value` to a configured code.
///
/// Entries are tried in order: a case-insensitive match on the code wins,
/// otherwise the entry's name must appear in the value as a whole word.
pub fn to_category(value: &str, table: &[CategoryCode]) -> Checked {
    let lowered = value.to_lowercase();
    for entry in table {
        if lowered == entry.code.to_lowercase() {
            return Checked::Valid(entry.code.clone());
        }
        if let Some(name) = &entry.name {
            if contains_word(&lowered, &name.to_lowercase()) {
                return Checked::Valid(entry.code.clone());
            }
        }
    }
    Checked::Invalid(value.to_string())
}

/// Optional sign, then digits; single underscores may group the digits
pub fn to_integer(value: &str) -> Checked {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    let whole = digits
        .split('_')
        .all(|group| !group.is_empty() && group.bytes().all(|b| b.is_ascii_digit()));
    if whole {
        Checked::Valid(value.to_string())
    } else {
        Checked::Invalid(value.to_string())
    }
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.map_or(false, char::is_alphanumeric) && !after.map_or(false, char::is_alphanumeric)
    })
}
