use super::error::CommandError;
use crate::dynamodb::TypedValue;

#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub name: String,
    pub value: TypedValue,
}

/// Parses `name=value`, splitting on the first `=`. The value is a number
/// when it starts with a decimal literal and has no `"` in it, otherwise a
/// string.
pub fn parse_key_value(input: &str) -> Result<KeyValue, CommandError> {
    let invalid = || CommandError::InvalidKeyValue {
        input: input.to_string(),
    };
    let (name, value) = input.split_once('=').ok_or_else(invalid)?;
    let name = name.trim();
    let value = value.trim();
    if name.is_empty() {
        return Err(invalid());
    }

    let value = if starts_with_float(value) && !value.contains('"') {
        TypedValue::N(value.to_string())
    } else {
        TypedValue::S(value.to_string())
    };

    Ok(KeyValue {
        name: name.to_string(),
        value,
    })
}

/// True when `text` begins with `[+-]digits[.digits]` (at least one digit).
/// Trailing characters are allowed, so `1,2` and `3abc` both qualify.
/// `inf`, `+Inf` and `nan` are not numbers here: DynamoDB has no such `N`
/// value, so they are classified as strings.
fn starts_with_float(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    let mut chars = digits.chars().peekable();
    let mut seen_digit = false;

    while chars.next_if(char::is_ascii_digit).is_some() {
        seen_digit = true;
    }
    if chars.next_if_eq(&'.').is_some() {
        while chars.next_if(char::is_ascii_digit).is_some() {
            seen_digit = true;
        }
    }
    seen_digit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_prefix_detection() {
        for number in ["0", "42", "-1", "+7", "3.14", ".5", "5.", "1,2", "12abc"] {
            assert!(starts_with_float(number), "{number} should scan as a number");
        }
        for text in ["", "-", ".", "abc", "x1", "+.", "-abc", "inf", "+Inf", "nan", "NaN"] {
            assert!(!starts_with_float(text), "{text} should not scan as a number");
        }
    }
}
