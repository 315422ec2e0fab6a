//! Declarative, field-level input validation.
//!
//! Rules are declared per field and evaluated eagerly; the first failing rule
//! for a field records its message and later rules for that field are
//! skipped. All fields are checked, so one call reports every bad field.
//!
//! ```ignore
//! let mut v = Validator::new();
//! v.rule_for("email", &input.email).not_empty().email();
//! v.rule_for("name", &input.name).not_empty().max_len(100);
//! v.finish()?;
//! ```

mod rules;

use serde::Serialize;
use thiserror::Error;

pub use rules::{Validate, MAX_STOCK};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every field that failed validation, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Error)]
#[error("validation failed: {}", describe(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// A single-field failure raised outside a [`Validator`].
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field: field.into(),
                message: message.into(),
            }],
        }
    }

    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule_for<'a>(&'a mut self, field: impl Into<String>, value: &'a str) -> StrRule<'a> {
        StrRule {
            field: field.into(),
            value,
            validator: self,
            failed: false,
        }
    }

    pub fn rule_for_number(&mut self, field: impl Into<String>, value: u64) -> NumberRule<'_> {
        NumberRule {
            field: field.into(),
            value,
            validator: self,
            failed: false,
        }
    }

    /// Records `message` against `field` unless `ok` holds.
    pub fn ensure(&mut self, field: impl Into<String>, ok: bool, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.push(field.into(), message.into());
        }
        self
    }

    /// Runs a nested validator, prefixing its field names (`shipping_address.city`).
    pub fn nested(&mut self, prefix: &str, inner: &impl Validate) -> &mut Self {
        if let Err(nested) = inner.validate() {
            for e in nested.errors {
                self.push(format!("{prefix}.{}", e.field), e.message);
            }
        }
        self
    }

    fn push(&mut self, field: String, message: String) {
        self.errors.push(FieldError { field, message });
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors { errors: self.errors })
        }
    }
}

pub struct StrRule<'a> {
    field: String,
    value: &'a str,
    validator: &'a mut Validator,
    failed: bool,
}

impl StrRule<'_> {
    pub fn must(mut self, ok: impl FnOnce(&str) -> bool, message: impl Into<String>) -> Self {
        if !self.failed && !ok(self.value) {
            self.failed = true;
            self.validator.push(self.field.clone(), message.into());
        }
        self
    }

    pub fn not_empty(self) -> Self {
        self.must(|v| !v.trim().is_empty(), "must not be empty")
    }

    pub fn max_len(self, max: usize) -> Self {
        self.must(
            |v| v.chars().count() <= max,
            format!("must be at most {max} characters"),
        )
    }

    pub fn exact_len(self, len: usize) -> Self {
        self.must(
            |v| v.chars().count() == len,
            format!("must be exactly {len} characters"),
        )
    }

    pub fn email(self) -> Self {
        self.must(is_email, "must be a valid email address")
    }

    /// Lower-case letters, digits and single dashes, e.g. `home-office`.
    pub fn slug(self) -> Self {
        self.must(is_slug, "must contain only lowercase letters, digits and dashes")
    }

    pub fn uppercase_ascii(self) -> Self {
        self.must(
            |v| v.chars().all(|c| c.is_ascii_uppercase()),
            "must contain only uppercase letters",
        )
    }
}

pub struct NumberRule<'a> {
    field: String,
    value: u64,
    validator: &'a mut Validator,
    failed: bool,
}

impl NumberRule<'_> {
    pub fn must(mut self, ok: impl FnOnce(u64) -> bool, message: impl Into<String>) -> Self {
        if !self.failed && !ok(self.value) {
            self.failed = true;
            self.validator.push(self.field.clone(), message.into());
        }
        self
    }

    pub fn positive(self) -> Self {
        self.must(|v| v > 0, "must be greater than zero")
    }

    pub fn at_most(self, max: u64) -> Self {
        self.must(|v| v <= max, format!("must be at most {max}"))
    }

    pub fn range(self, min: u64, max: u64) -> Self {
        self.must(
            |v| (min..=max).contains(&v),
            format!("must be between {min} and {max}"),
        )
    }
}

fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && !value.starts_with('-')
        && !value.ends_with('-')
        && !value.contains("--")
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_one_error_per_field() {
        let mut v = Validator::new();
        v.rule_for("email", "").not_empty().email();
        v.rule_for("name", "Ada").not_empty().max_len(2);
        v.rule_for_number("quantity", 0).positive().at_most(10);

        let err = v.finish().unwrap_err();
        assert_eq!(err.errors.len(), 3);
        assert_eq!(err.for_field("email"), Some("must not be empty"));
        assert_eq!(err.for_field("name"), Some("must be at most 2 characters"));
        assert_eq!(err.for_field("quantity"), Some("must be greater than zero"));
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let mut v = Validator::new();
        v.rule_for_number("low", 1).range(1, 5);
        v.rule_for_number("high", 5).range(1, 5);
        assert!(v.is_valid());
        v.rule_for_number("over", 6).range(1, 5);
        assert_eq!(v.finish().unwrap_err().for_field("over"), Some("must be between 1 and 5"));
    }

    #[test]
    fn test_valid_input_passes() {
        let mut v = Validator::new();
        v.rule_for("email", "ada@example.com").not_empty().email();
        v.rule_for("slug", "home-office").slug();
        assert!(v.is_valid());
        assert!(v.finish().is_ok());
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_email("a@b.co"));
        assert!(!is_email("a@b"));
        assert!(!is_email("@b.co"));
        assert!(!is_email("a@@b.co"));
        assert!(!is_email("a b@c.co"));
        assert!(!is_email("a@.co"));
    }

    #[test]
    fn test_slug_shapes() {
        assert!(is_slug("kitchen-2"));
        assert!(!is_slug("Kitchen"));
        assert!(!is_slug("-kitchen"));
        assert!(!is_slug("kit--chen"));
        assert!(!is_slug(""));
    }

    #[test]
    fn test_display_lists_fields() {
        let err = ValidationErrors::single("amount", "must be greater than zero");
        assert_eq!(err.to_string(), "validation failed: amount: must be greater than zero");
    }
}
