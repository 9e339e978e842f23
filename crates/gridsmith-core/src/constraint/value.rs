//! Keystroke-driven editing of constraint values.

use crate::input::keys;

/// What characters a value may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueCharset {
    Digits,
    Letters,
    /// Any printable text.
    Text,
    /// One of a fixed set of words.
    Choice(&'static [&'static str]),
}

/// Validation rules for a tool's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRules {
    pub charset: ValueCharset,
    /// Maximum length in characters; `None` is unbounded.
    pub max_len: Option<usize>,
    /// Allow a leading `-`.
    pub allow_sign: bool,
    /// Allow a leading `<`, `>`, `<=` or `>=`.
    pub allow_inequality: bool,
    /// Allow a variable name in place of digits.
    pub allow_variable: bool,
}

impl ValueRules {
    const fn base(charset: ValueCharset, max_len: Option<usize>) -> Self {
        Self {
            charset,
            max_len,
            allow_sign: false,
            allow_inequality: false,
            allow_variable: false,
        }
    }

    pub const fn digits(max_len: usize) -> Self {
        Self::base(ValueCharset::Digits, Some(max_len))
    }

    pub const fn letters(max_len: usize) -> Self {
        Self::base(ValueCharset::Letters, Some(max_len))
    }

    pub const fn text(max_len: Option<usize>) -> Self {
        Self::base(ValueCharset::Text, max_len)
    }

    pub const fn choice(options: &'static [&'static str]) -> Self {
        Self::base(ValueCharset::Choice(options), None)
    }

    pub const fn signed(mut self) -> Self {
        self.allow_sign = true;
        self
    }

    pub const fn inequality(mut self) -> Self {
        self.allow_inequality = true;
        self
    }

    pub const fn variables(mut self) -> Self {
        self.allow_variable = true;
        self
    }

    /// True if `value` is complete or a valid prefix of a complete value.
    pub fn accepts(&self, value: &str) -> bool {
        if value.is_empty() {
            return true;
        }
        if let Some(max) = self.max_len {
            if value.chars().count() > max {
                return false;
            }
        }
        match self.charset {
            ValueCharset::Text => value.chars().all(|c| !c.is_control()),
            ValueCharset::Letters => value.chars().all(char::is_alphabetic),
            ValueCharset::Choice(options) => options.iter().any(|o| o.starts_with(value)),
            ValueCharset::Digits => self.accepts_number(value),
        }
    }

    fn accepts_number(&self, value: &str) -> bool {
        let mut rest = value;
        if self.allow_inequality {
            if let Some(stripped) = rest.strip_prefix(['<', '>']) {
                rest = stripped.strip_prefix('=').unwrap_or(stripped);
            }
        }
        if self.allow_sign {
            rest = rest.strip_prefix('-').unwrap_or(rest);
        }
        if rest.chars().all(|c| c.is_ascii_digit()) {
            return true;
        }
        self.allow_variable && is_identifier(rest)
    }
}

/// True for names made of letters, digits and `_`, not starting with a digit.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Apply one key press to `current`.
///
/// `Backspace` removes the last character; a single printable character is
/// appended. Returns `None` when the key is ignored or the result would
/// violate `rules`.
pub fn apply_key(current: &str, key: &str, rules: &ValueRules) -> Option<String> {
    let next = if key == keys::BACKSPACE {
        let mut value = current.to_string();
        value.pop()?;
        value
    } else {
        let mut chars = key.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            return None;
        };
        if ch.is_control() {
            return None;
        }
        format!("{current}{ch}")
    };
    rules.accepts(&next).then_some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_with_limit() {
        let rules = ValueRules::digits(2);
        assert_eq!(apply_key("", "1", &rules), Some("1".to_string()));
        assert_eq!(apply_key("1", "2", &rules), Some("12".to_string()));
        assert_eq!(apply_key("12", "3", &rules), None);
        assert_eq!(apply_key("1", "a", &rules), None);
        assert_eq!(apply_key("1", "-", &rules), None);
    }

    #[test]
    fn test_backspace() {
        let rules = ValueRules::digits(2);
        assert_eq!(apply_key("12", "Backspace", &rules), Some("1".to_string()));
        assert_eq!(apply_key("", "Backspace", &rules), None);
    }

    #[test]
    fn test_named_keys_are_ignored() {
        let rules = ValueRules::text(None);
        assert_eq!(apply_key("a", "ArrowLeft", &rules), None);
        assert_eq!(apply_key("a", "\t", &rules), None);
    }

    #[test]
    fn test_cage_value_prefixes() {
        let rules = ValueRules::digits(3).signed().inequality().variables();
        assert!(rules.accepts("-"));
        assert!(rules.accepts("<"));
        assert!(rules.accepts("<="));
        assert!(rules.accepts(">=12"));
        assert!(rules.accepts("x"));
        assert!(rules.accepts("-x1"));
        assert!(!rules.accepts("1x"));
        assert!(!rules.accepts("1234"));
    }

    #[test]
    fn test_choice_values() {
        let rules = ValueRules::choice(&["X", "V"]);
        assert_eq!(apply_key("", "X", &rules), Some("X".to_string()));
        assert_eq!(apply_key("X", "V", &rules), None);
        assert_eq!(apply_key("", "Y", &rules), None);
    }

    #[test]
    fn test_free_text_is_unbounded() {
        let rules = ValueRules::text(None);
        let long = "1234567890".repeat(5);
        assert_eq!(apply_key(&long, "1", &rules).map(|s| s.len()), Some(51));
    }

    #[test]
    fn test_identifier() {
        assert!(is_identifier("total_2"));
        assert!(is_identifier("_x"));
        assert!(!is_identifier("2x"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a-b"));
    }
}
