use super::*;

pub(crate) fn to_integer(n: f64) -> f64 {
    if n.is_nan() {
        0.0
    } else if n.is_infinite() || n == 0.0 {
        n
    } else {
        n.trunc()
    }
}

// §9.2 ToBoolean
pub(crate) fn to_boolean(val: &JsValue) -> bool {
    match val {
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Boolean(b) => *b,
        JsValue::Number(n) => *n != 0.0 && !n.is_nan(),
        JsValue::String(s) => !s.is_empty(),
        JsValue::Object(_) => true,
    }
}

// §9.3 ToNumber, primitives only
pub(crate) fn to_number(val: &JsValue) -> f64 {
    match val {
        JsValue::Undefined => f64::NAN,
        JsValue::Null => 0.0,
        JsValue::Boolean(b) => *b as u8 as f64,
        JsValue::Number(n) => *n,
        JsValue::String(s) => string_to_number(s),
        JsValue::Object(_) => f64::NAN,
    }
}

fn is_str_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0009}' | '\u{000B}' | '\u{000C}' | ' ' | '\u{00A0}' | '\u{000A}' | '\u{000D}'
            | '\u{2028}' | '\u{2029}'
    ) || (c != '\u{FEFF}' && c.is_whitespace())
}

// §9.3.1 ToNumber applied to the String type
pub(crate) fn string_to_number(s: &JsString) -> f64 {
    let rust_str = s.to_rust_string();
    let trimmed = rust_str.trim_matches(is_str_whitespace);
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return f64::NAN;
        }
        return hex
            .chars()
            .fold(0.0, |acc, c| acc * 16.0 + c.to_digit(16).unwrap_or(0) as f64);
    }
    let (sign, unsigned) = match trimmed.as_bytes()[0] {
        b'+' => (1.0, &trimmed[1..]),
        b'-' => (-1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };
    if unsigned == "Infinity" {
        return sign * f64::INFINITY;
    }
    // Rust accepts spellings ("inf", "nan", "1e") that StrDecimalLiteral doesn't.
    let valid = !unsigned.is_empty()
        && !unsigned.starts_with(['+', '-'])
        && unsigned
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
        && unsigned.bytes().any(|b| b.is_ascii_digit());
    if !valid {
        return f64::NAN;
    }
    unsigned.parse::<f64>().map(|n| sign * n).unwrap_or(f64::NAN)
}

// §9.8 ToString, primitives only
pub(crate) fn primitive_to_string(val: &JsValue) -> JsString {
    match val {
        JsValue::String(s) => s.clone(),
        other => JsString::from(other.to_string()),
    }
}

// §11.9.6 Strict equality
pub(crate) fn strict_equality(left: &JsValue, right: &JsValue) -> bool {
    match (left, right) {
        (JsValue::Undefined, JsValue::Undefined) => true,
        (JsValue::Null, JsValue::Null) => true,
        (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
        (JsValue::Number(a), JsValue::Number(b)) => number_ops::equal(*a, *b),
        (JsValue::String(a), JsValue::String(b)) => a == b,
        (JsValue::Object(a), JsValue::Object(b)) => a.ptr_eq(b),
        _ => false,
    }
}

// §11.9.3 Abstract equality between primitives. Objects are converted by
// the interpreter before it gets here.
pub(crate) fn abstract_equality(left: &JsValue, right: &JsValue) -> bool {
    if std::mem::discriminant(left) == std::mem::discriminant(right) {
        return strict_equality(left, right);
    }
    if left.is_nullish() && right.is_nullish() {
        return true;
    }
    if left.is_nullish() || right.is_nullish() {
        return false;
    }
    if left.is_number() && right.is_string() {
        return abstract_equality(left, &JsValue::Number(to_number(right)));
    }
    if left.is_string() && right.is_number() {
        return abstract_equality(&JsValue::Number(to_number(left)), right);
    }
    if left.is_boolean() {
        return abstract_equality(&JsValue::Number(to_number(left)), right);
    }
    if right.is_boolean() {
        return abstract_equality(left, &JsValue::Number(to_number(right)));
    }
    false
}

// §11.8.5 Abstract relational comparison on primitives; `None` is undefined
pub(crate) fn abstract_relational(left: &JsValue, right: &JsValue) -> Option<bool> {
    if let (JsValue::String(l), JsValue::String(r)) = (left, right) {
        return Some(l < r);
    }
    number_ops::less_than(to_number(left), to_number(right))
}

// §11.4.3 typeof
pub(crate) fn typeof_val(val: &JsValue) -> &'static str {
    match val {
        JsValue::Undefined => "undefined",
        JsValue::Null => "object",
        JsValue::Boolean(_) => "boolean",
        JsValue::Number(_) => "number",
        JsValue::String(_) => "string",
        JsValue::Object(o) if o.is_callable() => "function",
        JsValue::Object(_) => "object",
    }
}

/// Canonical array index for a property key, per §15.4.
pub(crate) fn array_index(key: &str) -> Option<u32> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match key.parse::<u32>() {
        Ok(n) if n != u32::MAX => Some(n),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(s: &str) -> f64 {
        string_to_number(&JsString::from_str(s))
    }

    #[test]
    fn string_to_number_grammar() {
        assert_eq!(num(""), 0.0);
        assert_eq!(num("  42\n"), 42.0);
        assert_eq!(num("0x1F"), 31.0);
        assert_eq!(num("-1.5e2"), -150.0);
        assert_eq!(num(".5"), 0.5);
        assert_eq!(num("-Infinity"), f64::NEG_INFINITY);
        assert!(num("inf").is_nan());
        assert!(num("12px").is_nan());
        assert!(num("0x").is_nan());
        assert!(num("NaN").is_nan());
    }

    #[test]
    fn abstract_equality_table() {
        let s = |v: &str| JsValue::from_str(v);
        assert!(abstract_equality(&JsValue::Null, &JsValue::Undefined));
        assert!(!abstract_equality(&JsValue::Null, &JsValue::Number(0.0)));
        assert!(abstract_equality(&JsValue::Number(1.0), &s("1")));
        assert!(abstract_equality(&JsValue::Boolean(true), &s("1")));
        assert!(abstract_equality(&JsValue::Boolean(false), &JsValue::Number(0.0)));
        assert!(!abstract_equality(&JsValue::Number(f64::NAN), &JsValue::Number(f64::NAN)));
    }

    #[test]
    fn strict_equality_does_not_coerce() {
        assert!(!strict_equality(&JsValue::Number(1.0), &JsValue::from_str("1")));
        assert!(strict_equality(&JsValue::Number(0.0), &JsValue::Number(-0.0)));
    }

    #[test]
    fn relational_strings_compare_by_code_unit() {
        let s = |v: &str| JsValue::from_str(v);
        assert_eq!(abstract_relational(&s("B"), &s("a")), Some(true));
        assert_eq!(abstract_relational(&s("10"), &JsValue::Number(9.0)), Some(false));
        assert_eq!(abstract_relational(&JsValue::Number(f64::NAN), &JsValue::Number(1.0)), None);
    }

    #[test]
    fn array_index_forms() {
        assert_eq!(array_index("0"), Some(0));
        assert_eq!(array_index("17"), Some(17));
        assert_eq!(array_index("017"), None);
        assert_eq!(array_index("4294967295"), None);
        assert_eq!(array_index("1.5"), None);
        assert_eq!(array_index("-1"), None);
    }

    #[test]
    fn to_boolean_table() {
        assert!(!to_boolean(&JsValue::from_str("")));
        assert!(to_boolean(&JsValue::from_str("0")));
        assert!(!to_boolean(&JsValue::Number(f64::NAN)));
        assert!(!to_boolean(&JsValue::Number(-0.0)));
    }
}
