//! Request parsing and validation.
//!
//! Fields are kept as raw JSON values until validation so that a wrong type
//! becomes a field-named client error rather than a body decode failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::features::{
    classify_property_type, normalize_furnishing, CanonicalFeatureRecord, Furnishing,
    PropertyType,
};
use crate::locality::{self, ResolveMode, OTHER};

/// Smallest flat the service will price, in square feet.
pub const MIN_AREA_SQFT: f64 = 450.0;

/// Client errors; each message names the offending field.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Invalid numeric input for {0}")]
    InvalidNumeric(&'static str),
    #[error("Invalid text input for {0}")]
    InvalidText(&'static str),
    #[error("{field} {reason}")]
    OutOfRange {
        field: &'static str,
        reason: String,
    },
    #[error("Request body must be a JSON object")]
    MalformedBody,
}

/// Body of a prediction request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(default)]
    pub bedrooms: Option<Value>,
    #[serde(default)]
    pub bathrooms: Option<Value>,
    #[serde(default)]
    pub area_sqft: Option<Value>,
    #[serde(default)]
    pub furnishing: Option<Value>,
    #[serde(default)]
    pub property_type: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Value>,
}

impl PredictionRequest {
    /// A request with every required field set.
    pub fn new(
        bedrooms: u32,
        bathrooms: u32,
        area_sqft: f64,
        furnishing: &str,
        property_type: &str,
    ) -> Self {
        Self {
            bedrooms: Some(Value::from(bedrooms)),
            bathrooms: Some(Value::from(bathrooms)),
            area_sqft: Some(Value::from(area_sqft)),
            furnishing: Some(Value::from(furnishing)),
            property_type: Some(Value::from(property_type)),
            locality: None,
            address: None,
        }
    }

    pub fn with_locality(mut self, locality: &str) -> Self {
        self.locality = Some(Value::from(locality));
        self
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.address = Some(Value::from(address));
        self
    }

    /// Decode a JSON body; anything but an object is malformed.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        if !body.is_object() {
            return Err(ValidationError::MalformedBody);
        }
        serde_json::from_value(body.clone()).map_err(|_| ValidationError::MalformedBody)
    }

    fn field(&self, name: &str) -> Option<&Value> {
        let value = match name {
            "bedrooms" => self.bedrooms.as_ref(),
            "bathrooms" => self.bathrooms.as_ref(),
            "area_sqft" => self.area_sqft.as_ref(),
            "furnishing" => self.furnishing.as_ref(),
            "property_type" => self.property_type.as_ref(),
            "locality" => self.locality.as_ref(),
            "address" => self.address.as_ref(),
            _ => None,
        };
        value.filter(|v| !v.is_null())
    }
}

/// A request whose fields are present, typed and in range.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedRequest {
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area_sqft: f64,
    pub furnishing: Furnishing,
    pub property_type: PropertyType,
    /// Address when given, otherwise the locality field.
    pub locality_text: Option<String>,
}

fn as_integer(value: &Value, field: &'static str) -> Result<i64, ValidationError> {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or(ValidationError::InvalidNumeric(field))
}

fn as_float(value: &Value, field: &'static str) -> Result<f64, ValidationError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|f| f.is_finite())
        .ok_or(ValidationError::InvalidNumeric(field))
}

fn as_text<'a>(value: &'a Value, field: &'static str) -> Result<&'a str, ValidationError> {
    value.as_str().ok_or(ValidationError::InvalidText(field))
}

fn at_least_one(value: i64, field: &'static str) -> Result<u32, ValidationError> {
    if value < 1 {
        return Err(ValidationError::OutOfRange {
            field,
            reason: "must be at least 1".to_string(),
        });
    }
    u32::try_from(value).map_err(|_| ValidationError::OutOfRange {
        field,
        reason: "is too large".to_string(),
    })
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Validate stage.
pub fn validate(request: &PredictionRequest) -> Result<ValidatedRequest, ValidationError> {
    let required = |name: &'static str| {
        request
            .field(name)
            .ok_or(ValidationError::MissingField(name))
    };
    let bedrooms = required("bedrooms")?;
    let bathrooms = required("bathrooms")?;
    let area = required("area_sqft")?;
    let furnishing = required("furnishing")?;
    let property_type = required("property_type")?;

    let bedrooms = at_least_one(as_integer(bedrooms, "bedrooms")?, "bedrooms")?;
    let bathrooms = at_least_one(as_integer(bathrooms, "bathrooms")?, "bathrooms")?;
    let area_sqft = as_float(area, "area_sqft")?;
    if area_sqft < MIN_AREA_SQFT {
        return Err(ValidationError::OutOfRange {
            field: "area_sqft",
            reason: format!("must be at least {} sqft", MIN_AREA_SQFT),
        });
    }

    Ok(ValidatedRequest {
        bedrooms,
        bathrooms,
        area_sqft,
        furnishing: normalize_furnishing(Some(as_text(furnishing, "furnishing")?)),
        property_type: classify_property_type(as_text(property_type, "property_type")?),
        locality_text: optional_text(request.field("address"))
            .or_else(|| optional_text(request.field("locality"))),
    })
}

/// Normalize stage: resolve the locality with the inference rules.
pub fn normalize(validated: ValidatedRequest) -> CanonicalFeatureRecord {
    let locality = locality::resolve(validated.locality_text.as_deref(), ResolveMode::Inference);
    if locality == OTHER {
        tracing::debug!(input = ?validated.locality_text, "locality not recognised, using Other");
    }
    CanonicalFeatureRecord {
        bedrooms: validated.bedrooms,
        bathrooms: validated.bathrooms,
        area_sqft: validated.area_sqft,
        furnishing: validated.furnishing,
        property_type: validated.property_type,
        locality,
    }
}
