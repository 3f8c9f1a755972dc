use std::fmt;

#[derive(Clone, Debug)]
pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Symbol(JsSymbol),
    Object(JsObject),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsSymbol {
    pub id: u64,
    pub description: Option<String>,
}

impl JsSymbol {
    /// Convert to the internal property key string. The unique id keeps
    /// symbols with equal descriptions apart.
    pub fn to_property_key(&self) -> String {
        match &self.description {
            Some(desc) => format!("@@Symbol({desc})#{}", self.id),
            None => format!("@@Symbol()#{}", self.id),
        }
    }
}

pub fn is_symbol_key(key: &str) -> bool {
    key.starts_with("@@Symbol(")
}

/// Handle into the interpreter's object arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JsObject {
    pub id: u64,
}

impl JsValue {
    pub fn str(s: &str) -> Self {
        JsValue::String(s.to_string())
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, JsValue::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, JsValue::Undefined | JsValue::Null)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JsValue::Object(_))
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            JsValue::Undefined => "undefined",
            JsValue::Null => "object",
            JsValue::Boolean(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::String(_) => "string",
            JsValue::Symbol(_) => "symbol",
            JsValue::Object(_) => "object",
        }
    }
}

// §7.1.2 ToBoolean
pub fn to_boolean(val: &JsValue) -> bool {
    match val {
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Boolean(b) => *b,
        JsValue::Number(n) => *n != 0.0 && !n.is_nan(),
        JsValue::String(s) => !s.is_empty(),
        JsValue::Symbol(_) | JsValue::Object(_) => true,
    }
}

// §7.2.16 IsStrictlyEqual
pub fn strict_equality(left: &JsValue, right: &JsValue) -> bool {
    match (left, right) {
        (JsValue::Undefined, JsValue::Undefined) | (JsValue::Null, JsValue::Null) => true,
        (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
        (JsValue::Number(a), JsValue::Number(b)) => number_ops::equal(*a, *b),
        (JsValue::String(a), JsValue::String(b)) => a == b,
        (JsValue::Symbol(a), JsValue::Symbol(b)) => a.id == b.id,
        (JsValue::Object(a), JsValue::Object(b)) => a.id == b.id,
        _ => false,
    }
}

// §7.2.10 SameValue
pub fn same_value(left: &JsValue, right: &JsValue) -> bool {
    match (left, right) {
        (JsValue::Number(a), JsValue::Number(b)) => number_ops::same_value(*a, *b),
        _ => strict_equality(left, right),
    }
}

// §6.1.6.1 Number type operations
pub mod number_ops {
    pub fn less_than(x: f64, y: f64) -> Option<bool> {
        if x.is_nan() || y.is_nan() {
            None
        } else {
            Some(x < y)
        }
    }

    pub fn equal(x: f64, y: f64) -> bool {
        if x.is_nan() || y.is_nan() {
            return false;
        }
        x == y
    }

    pub fn same_value(x: f64, y: f64) -> bool {
        if x.is_nan() && y.is_nan() {
            return true;
        }
        if x == 0.0 && y == 0.0 {
            return x.is_sign_positive() == y.is_sign_positive();
        }
        x == y
    }

    // §6.1.6.1.20 Number::toString
    pub fn to_string(x: f64) -> String {
        if x.is_nan() {
            return "NaN".to_string();
        }
        if x == 0.0 {
            return "0".to_string();
        }
        if x.is_infinite() {
            return if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
        }
        let mut buf = ryu_js::Buffer::new();
        buf.format(x).to_string()
    }

    // §7.1.4.1.1 StringToNumber, decimal and radix-prefixed forms only
    pub fn from_str(s: &str) -> f64 {
        let t = s.trim();
        if t.is_empty() {
            return 0.0;
        }
        let radix = |prefix: &[&str], radix: u32| {
            prefix
                .iter()
                .find_map(|p| t.strip_prefix(p))
                .map(|digits| u64::from_str_radix(digits, radix).map_or(f64::NAN, |v| v as f64))
        };
        if let Some(v) = radix(&["0x", "0X"], 16)
            .or_else(|| radix(&["0o", "0O"], 8))
            .or_else(|| radix(&["0b", "0B"], 2))
        {
            return v;
        }
        match t {
            "Infinity" | "+Infinity" => f64::INFINITY,
            "-Infinity" => f64::NEG_INFINITY,
            _ if t.contains(|c: char| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => {
                f64::NAN
            }
            _ => t.parse::<f64>().unwrap_or(f64::NAN),
        }
    }
}

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "undefined"),
            JsValue::Null => write!(f, "null"),
            JsValue::Boolean(b) => write!(f, "{b}"),
            JsValue::Number(n) => write!(f, "{}", number_ops::to_string(*n)),
            JsValue::String(s) => write!(f, "{s}"),
            JsValue::Symbol(s) => match &s.description {
                Some(desc) => write!(f, "Symbol({desc})"),
                None => write!(f, "Symbol()"),
            },
            JsValue::Object(_) => write!(f, "[object Object]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_special_values() {
        assert_eq!(number_ops::to_string(f64::NAN), "NaN");
        assert_eq!(number_ops::to_string(0.0), "0");
        assert_eq!(number_ops::to_string(-0.0), "0");
        assert_eq!(number_ops::to_string(f64::INFINITY), "Infinity");
        assert_eq!(number_ops::to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn number_to_string_shortest_form() {
        assert_eq!(number_ops::to_string(42.0), "42");
        assert_eq!(number_ops::to_string(4.2), "4.2");
        assert_eq!(number_ops::to_string(1e21), "1e+21");
        assert_eq!(number_ops::to_string(0.000001), "0.000001");
        assert_eq!(number_ops::to_string(1e-7), "1e-7");
    }

    #[test]
    fn number_same_value() {
        assert!(number_ops::same_value(f64::NAN, f64::NAN));
        assert!(!number_ops::same_value(0.0, -0.0));
        assert!(number_ops::same_value(0.0, 0.0));
    }

    #[test]
    fn string_to_number() {
        assert_eq!(number_ops::from_str(" 12 "), 12.0);
        assert_eq!(number_ops::from_str(""), 0.0);
        assert_eq!(number_ops::from_str("0x1f"), 31.0);
        assert_eq!(number_ops::from_str("1e3"), 1000.0);
        assert!(number_ops::from_str("abc").is_nan());
    }

    #[test]
    fn symbols_compare_by_identity() {
        let a = JsValue::Symbol(JsSymbol {
            id: 1,
            description: Some("x".into()),
        });
        let b = JsValue::Symbol(JsSymbol {
            id: 2,
            description: Some("x".into()),
        });
        assert!(strict_equality(&a, &a));
        assert!(!strict_equality(&a, &b));
    }

    #[test]
    fn display_values() {
        assert_eq!(format!("{}", JsValue::Undefined), "undefined");
        assert_eq!(format!("{}", JsValue::Null), "null");
        assert_eq!(format!("{}", JsValue::Boolean(true)), "true");
        assert_eq!(format!("{}", JsValue::Number(42.0)), "42");
        assert_eq!(format!("{}", JsValue::str("hi")), "hi");
    }
}
