//! Schema validation for pluggable implementation config tables.
//!
//! Backends such as storage receive a raw `toml::Value` for their section.
//! Each backend describes the keys it accepts with a `Schema`, and the config
//! layer validates the table before the backend factory runs.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
	#[error("Unknown field: {0}")]
	UnknownField(String),
	#[error("Failed to deserialize config: {0}")]
	DeserializationError(String),
}

impl ValidationError {
	/// Qualifies the field path with the enclosing table name.
	fn nested_in(self, parent: &str) -> Self {
		let join = |f: String| format!("{}.{}", parent, f);
		match self {
			Self::MissingField(f) => Self::MissingField(join(f)),
			Self::UnknownField(f) => Self::UnknownField(join(f)),
			Self::InvalidValue { field, message } => Self::InvalidValue {
				field: join(field),
				message,
			},
			Self::TypeMismatch {
				field,
				expected,
				actual,
			} => Self::TypeMismatch {
				field: join(field),
				expected,
				actual,
			},
			other => other,
		}
	}

	fn mismatch(field: &str, expected: &str, value: &toml::Value) -> Self {
		Self::TypeMismatch {
			field: field.to_string(),
			expected: expected.to_string(),
			actual: value.type_str().to_string(),
		}
	}
}

/// Expected type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	String,
	/// Integer with optional inclusive bounds.
	Integer { min: Option<i64>, max: Option<i64> },
	Boolean,
	Array(Box<FieldType>),
	Table(Schema),
}

/// Custom check run after the type check passed.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A named field in a schema.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		check_type(&self.name, value, &self.field_type)?;
		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}
		Ok(())
	}
}

/// Set of required and optional fields of one TOML table.
///
/// By default keys that are not declared are accepted; `deny_unknown` makes
/// them an error so typos in backend sections surface at startup.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
	pub deny_unknown: bool,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self {
			required,
			optional,
			deny_unknown: false,
		}
	}

	pub fn deny_unknown(mut self) -> Self {
		self.deny_unknown = true;
		self
	}

	/// Validates a table against this schema.
	///
	/// # Errors
	///
	/// Returns the first missing, mistyped, rejected or (when denied) unknown
	/// field, with its dotted path for nested tables.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::mismatch("root", "table", config))?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			field.check(value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(value)?;
			}
		}

		if self.deny_unknown {
			let known = |key: &str| {
				self.required
					.iter()
					.chain(self.optional.iter())
					.any(|f| f.name == key)
			};
			if let Some(key) = table.keys().find(|k| !known(k)) {
				return Err(ValidationError::UnknownField(key.clone()));
			}
		}

		Ok(())
	}
}

fn check_type(
	field: &str,
	value: &toml::Value,
	expected: &FieldType,
) -> Result<(), ValidationError> {
	match expected {
		FieldType::String if !value.is_str() => {
			Err(ValidationError::mismatch(field, "string", value))
		},
		FieldType::Boolean if !value.is_bool() => {
			Err(ValidationError::mismatch(field, "boolean", value))
		},
		FieldType::String | FieldType::Boolean => Ok(()),
		FieldType::Integer { min, max } => {
			let n = value
				.as_integer()
				.ok_or_else(|| ValidationError::mismatch(field, "integer", value))?;
			let out_of_range = |message: String| ValidationError::InvalidValue {
				field: field.to_string(),
				message,
			};
			match (min, max) {
				(Some(lo), _) if n < *lo => Err(out_of_range(format!(
					"Value {} is less than minimum {}",
					n, lo
				))),
				(_, Some(hi)) if n > *hi => Err(out_of_range(format!(
					"Value {} is greater than maximum {}",
					n, hi
				))),
				_ => Ok(()),
			}
		},
		FieldType::Array(inner) => {
			let items = value
				.as_array()
				.ok_or_else(|| ValidationError::mismatch(field, "array", value))?;
			items
				.iter()
				.enumerate()
				.try_for_each(|(i, item)| check_type(&format!("{}[{}]", field, i), item, inner))
		},
		FieldType::Table(schema) => schema.validate(value).map_err(|e| e.nested_in(field)),
	}
}

/// Configuration schema of a pluggable implementation.
#[async_trait]
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn schema() -> Schema {
		Schema::new(
			vec![Field::new("storage_path", FieldType::String)],
			vec![
				Field::new(
					"ttl_seconds",
					FieldType::Integer {
						min: Some(0),
						max: Some(86400),
					},
				),
				Field::new(
					"limits",
					FieldType::Table(Schema::new(
						vec![Field::new("max", FieldType::Integer { min: Some(1), max: None })],
						vec![],
					)),
				),
			],
		)
	}

	#[test]
	fn test_valid_table_passes() {
		let value: toml::Value = toml::from_str(
			r#"
storage_path = "./data"
ttl_seconds = 60
extra = true
"#,
		)
		.unwrap();
		assert!(schema().validate(&value).is_ok());
	}

	#[test]
	fn test_missing_and_out_of_range() {
		let missing: toml::Value = toml::from_str("ttl_seconds = 1").unwrap();
		assert!(matches!(
			schema().validate(&missing),
			Err(ValidationError::MissingField(f)) if f == "storage_path"
		));

		let too_big: toml::Value =
			toml::from_str("storage_path = \"x\"\nttl_seconds = 100000").unwrap();
		assert!(matches!(
			schema().validate(&too_big),
			Err(ValidationError::InvalidValue { .. })
		));
	}

	#[test]
	fn test_nested_errors_carry_path() {
		let value: toml::Value =
			toml::from_str("storage_path = \"x\"\n[limits]\nmax = 0").unwrap();
		match schema().validate(&value) {
			Err(ValidationError::InvalidValue { field, .. }) => assert_eq!(field, "limits.max"),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn test_deny_unknown_rejects_extra_keys() {
		let value: toml::Value = toml::from_str("storage_path = \"x\"\nextra = 1").unwrap();
		assert!(matches!(
			schema().deny_unknown().validate(&value),
			Err(ValidationError::UnknownField(k)) if k == "extra"
		));
	}

	#[test]
	fn test_validator_runs_after_type_check() {
		let schema = Schema::new(
			vec![Field::new("path", FieldType::String).with_validator(|v| {
				match v.as_str() {
					Some("") => Err("must not be empty".into()),
					_ => Ok(()),
				}
			})],
			vec![],
		);
		let empty: toml::Value = toml::from_str("path = \"\"").unwrap();
		let number: toml::Value = toml::from_str("path = 1").unwrap();
		assert!(matches!(
			schema.validate(&empty),
			Err(ValidationError::InvalidValue { .. })
		));
		assert!(matches!(
			schema.validate(&number),
			Err(ValidationError::TypeMismatch { .. })
		));
	}
}
