//! API models for products.
//!
//! [`Product`] is the record exchanged over HTTP. Request bodies are validated field by field
//! from an untyped JSON value by [`Product::apply_json`] instead of a typed serde derive, so
//! that every failure is reported as a [`DataValidationError`] naming the offending field.

use crate::db::handlers::products::ProductFilter;
use crate::db::models::products::ProductDBResponse;
use crate::types::{Category, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::{fmt, str::FromStr};
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};

/// Maximum length of a product name
pub const NAME_MAX_LEN: usize = 100;
/// Maximum length of a product description
pub const DESCRIPTION_MAX_LEN: usize = 250;
/// Significant digits a price can carry
const MAX_PRICE_DIGITS: usize = 28;

/// A product record that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataValidationError {
    /// The payload was not a JSON object
    #[error("Invalid product: body of request contained bad or no data")]
    NotAnObject,

    /// A required key was absent
    #[error("Invalid product: missing {0}")]
    MissingField(&'static str),

    /// A key was present with the wrong JSON type
    #[error("Invalid type for {expected} [{field}]: {found}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// A key had the right type but an unacceptable value
    #[error("Invalid value for [{field}]: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// An update was attempted on a record that was never persisted
    #[error("Update called with empty ID field")]
    MissingId,
}

impl DataValidationError {
    /// Short classification of the failure
    pub fn kind(&self) -> &'static str {
        match self {
            DataValidationError::NotAnObject => "bad data",
            DataValidationError::MissingField(_) => "missing field",
            DataValidationError::InvalidType { .. } => "invalid type",
            DataValidationError::InvalidValue { .. } => "invalid value",
            DataValidationError::MissingId => "missing id",
        }
    }
}

/// A product in the catalog.
///
/// `id` is `None` until the record has been stored; the database assigns it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Surrogate key, assigned on creation
    pub id: Option<ProductId>,
    /// Product name (1 to 100 characters)
    pub name: String,
    /// Free-form description (at most 250 characters)
    pub description: String,
    /// Price as a base-10 string, e.g. "12.50"
    #[schema(value_type = String, example = "12.50")]
    pub price: Decimal,
    /// Whether the product can currently be ordered
    pub available: bool,
    pub category: Category,
}

impl Product {
    pub fn new(name: impl Into<String>, description: impl Into<String>, price: Decimal, available: bool, category: Category) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: description.into(),
            price,
            available,
            category,
        }
    }

    /// Build an unsaved product from a JSON payload
    pub fn from_json(data: &Value) -> Result<Self, DataValidationError> {
        let mut product = Product::default();
        product.apply_json(data)?;
        Ok(product)
    }

    /// Overwrite every field except `id` from a JSON payload.
    ///
    /// All fields are validated before any is assigned, so on error the record is unchanged.
    pub fn apply_json(&mut self, data: &Value) -> Result<(), DataValidationError> {
        let object = data.as_object().ok_or(DataValidationError::NotAnObject)?;

        let name = parse_text(object, "name", NAME_MAX_LEN)?;
        if name.is_empty() {
            return Err(DataValidationError::InvalidValue {
                field: "name",
                reason: "must not be empty".to_string(),
            });
        }
        let description = parse_text(object, "description", DESCRIPTION_MAX_LEN)?;
        let price = parse_price(required(object, "price")?)?;
        let available = match required(object, "available")? {
            Value::Bool(b) => *b,
            other => {
                return Err(DataValidationError::InvalidType {
                    field: "available",
                    expected: "boolean",
                    found: json_type_name(other),
                });
            }
        };
        let category = match required(object, "category")? {
            Value::String(label) => label.parse::<Category>().map_err(|e| DataValidationError::InvalidValue {
                field: "category",
                reason: e.to_string(),
            })?,
            other => {
                return Err(DataValidationError::InvalidType {
                    field: "category",
                    expected: "string",
                    found: json_type_name(other),
                });
            }
        };

        self.name = name.to_string();
        self.description = description.to_string();
        self.price = price;
        self.available = available;
        self.category = category;
        Ok(())
    }

    /// JSON representation with the price as a string and the category as its label
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "description": self.description,
            "price": self.price.to_string(),
            "available": self.available,
            "category": self.category.as_str(),
        })
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "<Product {} id=[{}]>", self.name, id),
            None => write!(f, "<Product {} id=[None]>", self.name),
        }
    }
}

impl From<ProductDBResponse> for Product {
    fn from(db: ProductDBResponse) -> Self {
        Self {
            id: Some(db.id),
            name: db.name,
            description: db.description,
            price: db.price,
            available: db.available,
            category: db.category,
        }
    }
}

fn required<'a>(object: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, DataValidationError> {
    object.get(field).ok_or(DataValidationError::MissingField(field))
}

fn parse_text<'a>(object: &'a Map<String, Value>, field: &'static str, max_len: usize) -> Result<&'a str, DataValidationError> {
    let text = match required(object, field)? {
        Value::String(s) => s.as_str(),
        other => {
            return Err(DataValidationError::InvalidType {
                field,
                expected: "string",
                found: json_type_name(other),
            });
        }
    };
    if text.chars().count() > max_len {
        return Err(DataValidationError::InvalidValue {
            field,
            reason: format!("must be at most {max_len} characters"),
        });
    }
    Ok(text)
}

/// Prices are accepted as JSON strings ("12.50") or numbers (12.5). Only strings are exact: a JSON
/// number has already been read as an `f64`, so it keeps at most 17 significant digits.
fn parse_price(value: &Value) -> Result<Decimal, DataValidationError> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(DataValidationError::InvalidType {
                field: "price",
                expected: "decimal",
                found: json_type_name(other),
            });
        }
    };
    parse_decimal(&text).ok_or_else(|| DataValidationError::InvalidValue {
        field: "price",
        reason: format!("'{text}' is not a decimal number"),
    })
}

/// Parse a decimal without rounding. Input with more significant digits than a `Decimal` holds is
/// rejected rather than silently rounded.
pub(crate) fn parse_decimal(text: &str) -> Option<Decimal> {
    if let Ok(value) = Decimal::from_str_exact(text) {
        return Some(value);
    }

    let (mantissa, _) = text.split_once(['e', 'E'])?;
    let digits = mantissa.chars().filter(char::is_ascii_digit).skip_while(|&c| c == '0').count();
    if digits > MAX_PRICE_DIGITS {
        return None;
    }
    Decimal::from_scientific(text).ok()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Query parameters for listing products. All filters are optional and combine with AND.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ListProductsQuery {
    /// Exact product name
    pub name: Option<String>,
    /// Category label, case-insensitive (e.g. `food`)
    pub category: Option<String>,
    /// `true`, `yes` or `1` select available products; any other value selects unavailable ones
    pub available: Option<String>,
    /// Exact price, compared numerically
    pub price: Option<String>,
}

impl ListProductsQuery {
    /// Validate the raw query strings into a repository filter
    pub fn to_filter(&self) -> Result<ProductFilter, DataValidationError> {
        let category = self
            .category
            .as_deref()
            .map(|label| {
                label.trim().to_uppercase().parse::<Category>().map_err(|e| DataValidationError::InvalidValue {
                    field: "category",
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let available = self
            .available
            .as_deref()
            .map(|flag| matches!(flag.trim().to_lowercase().as_str(), "true" | "yes" | "1"));

        let price = self
            .price
            .as_deref()
            .map(|raw| {
                let text = raw.trim_matches(|c: char| c == ' ' || c == '"');
                parse_decimal(text).ok_or_else(|| DataValidationError::InvalidValue {
                    field: "price",
                    reason: format!("'{text}' is not a decimal number"),
                })
            })
            .transpose()?;

        Ok(ProductFilter::builder()
            .maybe_name(self.name.clone())
            .maybe_category(category)
            .maybe_available(available)
            .maybe_price(price)
            .build())
    }
}

/// Liveness response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub message: String,
}
