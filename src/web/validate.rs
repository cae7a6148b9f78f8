use crate::error::FieldError;

/// Field-level checks run by [`super::decode`] after deserializing a body.
pub trait Validate {
    fn validate(&self) -> Result<(), Vec<FieldError>>;
}

/// Collects field failures in the order the checks were made.
#[derive(Debug, Default)]
pub struct Violations {
    fields: Vec<FieldError>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(self, field: &str, value: &str) -> Self {
        let missing = value.trim().is_empty();
        self.check(missing, field, format!("{field} is a required field"))
    }

    pub fn required_list<T>(self, field: &str, values: &[T]) -> Self {
        self.check(values.is_empty(), field, format!("{field} is a required field"))
    }

    pub fn equal(self, field: &str, value: &str, other_field: &str, other: &str) -> Self {
        self.check(value != other, field, format!("{field} must be equal to {other_field}"))
    }

    pub fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(self.fields)
        }
    }

    fn check(mut self, failed: bool, field: &str, error: String) -> Self {
        if failed {
            self.fields.push(FieldError {
                field: field.to_string(),
                error,
            });
        }
        self
    }
}
