use crate::core::{DbError, Result};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;

lazy_static::lazy_static! {
    /// `IDENT OP LITERAL`, where LITERAL is a quoted string or one bare token.
    /// A bare token may contain quotes after its first character.
    static ref CONDITION_RE: Regex = Regex::new(
        r#"^\s*([^\s=!<>()'",]+)\s*(!=|<=|>=|=|<|>)\s*(?:"([^"]*)"|'([^']*)'|([^\s"'][^\s]*))\s*$"#
    )
    .expect("condition grammar is a valid regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "=" => CompareOp::Eq,
            "!=" => CompareOp::NotEq,
            "<" => CompareOp::Lt,
            "<=" => CompareOp::LtEq,
            ">" => CompareOp::Gt,
            ">=" => CompareOp::GtEq,
            _ => return None,
        })
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        }
    }
}

/// A single `column OP literal` predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub column: String,
    pub op: CompareOp,
    pub literal: String,
}

impl Condition {
    pub fn new(column: impl Into<String>, op: CompareOp, literal: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op,
            literal: literal.into(),
        }
    }

    /// Parses `col = val`, `col != "some text"`, `col >= (10)` and friends.
    ///
    /// Quoted literals lose their quotes; bare literals lose one layer of
    /// parentheses.
    pub fn parse(text: &str) -> Result<Self> {
        let caps = CONDITION_RE
            .captures(text)
            .ok_or_else(|| DbError::ConditionParse(format!("'{}' is not 'column op value'", text.trim())))?;

        let column = caps[1].to_string();
        let op = CompareOp::from_symbol(&caps[2])
            .ok_or_else(|| DbError::ConditionParse(format!("unknown operator '{}'", &caps[2])))?;

        let literal = if let Some(quoted) = caps.get(3).or_else(|| caps.get(4)) {
            quoted.as_str().to_string()
        } else {
            let bare = caps.get(5).map(|m| m.as_str()).unwrap_or_default();
            strip_parens(bare).to_string()
        };

        Ok(Self { column, op, literal })
    }

    /// Evaluates the predicate against the field value of `column`.
    ///
    /// `=` and `!=` are exact string comparisons. Ordering operators compare
    /// numerically when both sides parse as numbers, lexically otherwise.
    pub fn matches(&self, value: &str) -> bool {
        match self.op {
            CompareOp::Eq => value == self.literal,
            CompareOp::NotEq => value != self.literal,
            CompareOp::Lt => self.order(value) == Ordering::Less,
            CompareOp::LtEq => self.order(value) != Ordering::Greater,
            CompareOp::Gt => self.order(value) == Ordering::Greater,
            CompareOp::GtEq => self.order(value) != Ordering::Less,
        }
    }

    fn order(&self, value: &str) -> Ordering {
        match (value.trim().parse::<f64>(), self.literal.trim().parse::<f64>()) {
            (Ok(a), Ok(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => value.cmp(self.literal.as_str()),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.op.symbol(), self.literal)
    }
}

/// Strips one leading `(` and one trailing `)`, independently.
/// Byte-level, not quote-aware.
pub fn strip_parens(value: &str) -> &str {
    let value = value.strip_prefix('(').unwrap_or(value);
    value.strip_suffix(')').unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_equality() {
        let cond = Condition::parse("dept = Eng").unwrap();
        assert_eq!(cond, Condition::new("dept", CompareOp::Eq, "Eng"));
    }

    #[test]
    fn test_parse_without_spaces() {
        let cond = Condition::parse("age>=30").unwrap();
        assert_eq!(cond.column, "age");
        assert_eq!(cond.op, CompareOp::GtEq);
        assert_eq!(cond.literal, "30");
    }

    #[test]
    fn test_parse_quoted_literal_keeps_spaces() {
        let cond = Condition::parse("name != \"Alice Smith\"").unwrap();
        assert_eq!(cond.op, CompareOp::NotEq);
        assert_eq!(cond.literal, "Alice Smith");

        let cond = Condition::parse("name = 'Bob'").unwrap();
        assert_eq!(cond.literal, "Bob");
    }

    #[test]
    fn test_parse_bare_literal_with_apostrophe() {
        let cond = Condition::parse("name = O'Brien").unwrap();
        assert_eq!(cond.literal, "O'Brien");
        assert!(cond.matches("O'Brien"));

        assert!(Condition::parse("name = 'Brien").is_err());
    }

    #[test]
    fn test_parse_strips_one_layer_of_parens() {
        let cond = Condition::parse("dept = (Eng)").unwrap();
        assert_eq!(cond.literal, "Eng");
    }

    #[test]
    fn test_parse_qualified_column() {
        let cond = Condition::parse("employees.dept = Eng").unwrap();
        assert_eq!(cond.column, "employees.dept");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for text in ["", "dept", "dept =", "dept ~ Eng", "= Eng", "dept = Eng Sales"] {
            let err = Condition::parse(text).unwrap_err();
            assert!(matches!(err, DbError::ConditionParse(_)), "{:?} accepted", text);
        }
    }

    #[test]
    fn test_equality_is_exact_string_match() {
        let cond = Condition::parse("n = 1").unwrap();
        assert!(cond.matches("1"));
        assert!(!cond.matches("1.0"));
        assert!(!cond.matches(" 1"));
    }

    #[test]
    fn test_ordering_is_numeric_when_both_sides_are_numbers() {
        let cond = Condition::parse("n < 10").unwrap();
        assert!(cond.matches("9"));
        assert!(!cond.matches("10"));
        assert!(!cond.matches("100"));
    }

    #[test]
    fn test_ordering_falls_back_to_lexical() {
        let cond = Condition::parse("name > Bob").unwrap();
        assert!(cond.matches("Carol"));
        assert!(!cond.matches("Alice"));
        let cond = Condition::parse("name <= Bob").unwrap();
        assert!(cond.matches("Bob"));
    }

    #[test]
    fn test_strip_parens_is_independent_per_side() {
        assert_eq!(strip_parens("(x)"), "x");
        assert_eq!(strip_parens("(x"), "x");
        assert_eq!(strip_parens("x)"), "x");
        assert_eq!(strip_parens("((x))"), "(x)");
    }
}
