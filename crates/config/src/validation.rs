//! Validation helpers for configuration values

pub use crate::error::ValidationError;

/// A section of the config file that validates and merges itself
pub trait ConfigSection: Default {
    /// Returns every validation error found in the section
    fn validate(&self) -> Result<(), Vec<ValidationError>>;

    /// Merges another config section into this one, `other` wins
    fn merge(&mut self, other: Self);

    /// Returns the section name for error reporting
    fn section_name(&self) -> &'static str;
}

/// Common validators for config values
pub struct Validator;

impl Validator {
    /// Validates that a numeric value is within a range
    pub fn in_range<T>(value: T, min: T, max: T, field: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            Err(ValidationError::with_value(
                field,
                format!("must be between {} and {}", min, max),
                value,
            ))
        } else {
            Ok(())
        }
    }

    /// Validates that a string is not empty
    pub fn not_empty(value: &str, field: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            Err(ValidationError::new(field, "must not be empty"))
        } else {
            Ok(())
        }
    }

    /// Validates that a list has at least one entry and none of them are blank
    pub fn non_empty_list(values: &[String], field: &str) -> Vec<Result<(), ValidationError>> {
        if values.is_empty() {
            return vec![Err(ValidationError::new(field, "must not be empty"))];
        }

        values
            .iter()
            .enumerate()
            .map(|(i, value)| Self::not_empty(value, &format!("{}[{}]", field, i)))
            .collect()
    }

    /// Collects multiple validation results into a single result
    pub fn collect_errors(
        results: Vec<Result<(), ValidationError>>,
    ) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = results.into_iter().filter_map(|r| r.err()).collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
