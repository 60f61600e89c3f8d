//! Request validation helpers
//!
//! Field rules live in [`text`]. The rest of this module turns `validator` output into
//! an ordered list of [`FieldViolation`]s for problem responses.

pub mod text;

use serde::Serialize;
use serde_json::{Map, Value};
use validator::ValidationErrors;

pub use text::{
    contains_forbidden_text, validate_safe_text, validate_status, FORBIDDEN_TEXT_MESSAGE,
};

/// Declared field order of a request body, used to report violations deterministically.
pub trait FieldOrder {
    const FIELDS: &'static [&'static str];
}

/// One field-level problem in a request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    #[serde(rename = "type")]
    pub kind: String,
    pub loc: Vec<String>,
    pub msg: String,
    /// Offending value; dropped again by the problem scrubber before it reaches clients.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub ctx: Map<String, Value>,
}

impl FieldViolation {
    pub fn new(kind: impl Into<String>, loc: Vec<String>, msg: impl Into<String>) -> Self {
        FieldViolation {
            kind: kind.into(),
            loc,
            msg: msg.into(),
            input: None,
            ctx: Map::new(),
        }
    }
}

/// Flatten `errors` into violations, ordered by `order` and then by field name.
pub fn violations_from(errors: &ValidationErrors, order: &[&str]) -> Vec<FieldViolation> {
    let mut fields: Vec<_> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| (field.to_string(), errs))
        .collect();

    fields.sort_by(|(a, _), (b, _)| {
        let rank = |name: &str| order.iter().position(|f| *f == name).unwrap_or(order.len());
        rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
    });

    let mut violations = Vec::new();
    for (field, errs) in fields {
        for err in errs.iter() {
            let msg = err
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("invalid value for {}", field));

            let mut violation = FieldViolation::new(
                err.code.to_string(),
                vec!["body".to_string(), field.clone()],
                msg,
            );
            for (key, value) in err.params.iter() {
                if key == "value" {
                    violation.input = Some(value.clone());
                } else {
                    violation.ctx.insert(key.to_string(), value.clone());
                }
            }
            violations.push(violation);
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "too short"))]
        zeta: String,
        #[validate(custom(function = "validate_safe_text"))]
        alpha: String,
    }

    #[test]
    fn test_violations_follow_declared_order() {
        let sample = Sample {
            zeta: String::new(),
            alpha: "<x>".to_string(),
        };
        let errors = sample.validate().unwrap_err();

        let violations = violations_from(&errors, &["zeta", "alpha"]);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].loc, vec!["body", "zeta"]);
        assert_eq!(violations[0].msg, "too short");
        assert_eq!(violations[1].kind, "safe_text");
        assert_eq!(violations[1].input, Some(Value::String("<x>".to_string())));

        let violations = violations_from(&errors, &[]);
        assert_eq!(violations[0].loc, vec!["body", "alpha"]);
    }

    #[test]
    fn test_length_params_land_in_ctx() {
        let sample = Sample {
            zeta: String::new(),
            alpha: "ok".to_string(),
        };
        let errors = sample.validate().unwrap_err();
        let violations = violations_from(&errors, &["zeta", "alpha"]);
        assert_eq!(violations[0].ctx.get("min"), Some(&Value::from(1)));
        assert!(violations[0].input.is_some());
    }
}
