//! Payload contracts.
//!
//! A contract is a `serde` + `validator` struct describing the shape a
//! create or update payload must have. [`validate`] parses a JSON value
//! into the contract and flattens validator failures into a per-field
//! error map carried by an `Unprocessable` error:
//!
//! ```json
//! { "name": ["name must not be empty"], "skus[0].price": ["is out of range"] }
//! ```

use std::marker::PhantomData;

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::errors::B2BError;
use crate::hooks::{BeforeHook, HookContext};

/// Field path → list of messages.
#[derive(Debug, Default)]
pub struct SchemaErrors {
    map: Map<String, Value>,
}

impl SchemaErrors {
    pub fn push_schema(&mut self, msg: impl Into<String>) {
        self.push_field("_schema", msg);
    }

    pub fn push_field(&mut self, field: &str, msg: impl Into<String>) {
        let msg = Value::String(msg.into());
        match self.map.get_mut(field) {
            Some(Value::Array(arr)) => arr.push(msg),
            _ => {
                self.map.insert(field.to_string(), Value::Array(vec![msg]));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn into_unprocessable_anyhow(self, message: &str) -> anyhow::Error {
        B2BError::unprocessable(message)
            .with_errors(Value::Object(self.map))
            .into_anyhow()
    }
}

fn friendly_message(code: &str) -> Option<&'static str> {
    match code {
        "required" => Some("is required"),
        "email" => Some("must be a valid email"),
        "length" => Some("has invalid length"),
        "range" => Some("is out of range"),
        "url" => Some("must be a valid URL"),
        _ => None,
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

fn push_validation_errors(out: &mut SchemaErrors, prefix: &str, errs: &ValidationErrors) {
    for (field, kind) in errs.errors() {
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let key = join_path(prefix, field);
                for e in field_errors {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .or_else(|| friendly_message(&e.code).map(str::to_string))
                        .unwrap_or_else(|| e.code.to_string());
                    out.push_field(&key, msg);
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                push_validation_errors(out, &join_path(prefix, field), nested);
            }
            ValidationErrorsKind::List(items) => {
                let base = join_path(prefix, field);
                for (idx, nested) in items {
                    push_validation_errors(out, &format!("{base}[{idx}]"), nested);
                }
            }
        }
    }
}

/// Parse `data` into the contract `T` and run its validators.
pub fn validate<T>(data: &Value, error_message: &str) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let parsed: T = serde_json::from_value(data.clone()).map_err(|e| {
        B2BError::unprocessable(error_message)
            .with_errors(json!({"_schema": [e.to_string()]}))
            .into_anyhow()
    })?;

    if let Err(e) = parsed.validate() {
        let mut out = SchemaErrors::default();
        push_validation_errors(&mut out, "", &e);
        return Err(out.into_unprocessable_anyhow(error_message));
    }

    Ok(parsed)
}

/// Before hook rejecting payloads that do not satisfy the contract `T`.
///
/// The payload itself is left untouched for the service.
pub struct ValidateContract<T> {
    error_message: &'static str,
    _contract: PhantomData<fn() -> T>,
}

impl<T> ValidateContract<T> {
    pub fn new(error_message: &'static str) -> Self {
        Self {
            error_message,
            _contract: PhantomData,
        }
    }
}

#[async_trait]
impl<T> BeforeHook for ValidateContract<T>
where
    T: DeserializeOwned + Validate + 'static,
{
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        let data = ctx.data.as_ref().unwrap_or(&Value::Null);
        validate::<T>(data, self.error_message)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;
    use validator::Validate;

    use super::validate;
    use crate::errors::{B2BError, ErrorKind};

    #[derive(Debug, Deserialize, Validate)]
    struct Sku {
        #[validate(range(min = 0.0, message = "price must not be negative"))]
        price: f64,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Product {
        #[validate(length(min = 1, message = "name must not be empty"))]
        name: String,

        #[validate(nested)]
        skus: Vec<Sku>,
    }

    #[test]
    fn nested_and_list_errors_are_flattened_with_paths() {
        let data = json!({"name": "", "skus": [{"price": 1.0}, {"price": -2.0}]});

        let err = validate::<Product>(&data, "Products schema validation failed").unwrap_err();
        let b2b = B2BError::find(&err).expect("structured error");
        assert_eq!(b2b.kind, ErrorKind::Unprocessable);

        let errors = b2b.errors.as_ref().unwrap();
        assert_eq!(errors["name"][0], "name must not be empty");
        assert_eq!(errors["skus[1].price"][0], "price must not be negative");
    }

    #[test]
    fn shape_errors_land_under_schema_key() {
        let err = validate::<Product>(&json!({"skus": []}), "bad").unwrap_err();
        let b2b = B2BError::find(&err).unwrap();
        assert!(b2b.errors.as_ref().unwrap()["_schema"][0]
            .as_str()
            .unwrap()
            .contains("name"));
    }
}
