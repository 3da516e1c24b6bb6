//! Families, instances and their identifiers.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{family_types, parameters};
use crate::{Error, Result};

/// Parameter name to numeric value.
pub type ParameterValues = BTreeMap<String, f64>;

/// Opaque family identifier, generated once and never reused.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FamilyId(String);

impl FamilyId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an object in the host document.
///
/// Placed instances get a new id every time their geometry is replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tag selecting the geometry factory of a family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FamilyType(String);

impl FamilyType {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn rectangle() -> Self {
        Self(family_types::RECTANGLE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FamilyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named parametric family.
///
/// `parameters` holds the defaults offered for new inserts; its key set is the
/// schema every instance of the family must match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    /// Filled from the registry map key on load.
    #[serde(skip)]
    pub family_id: FamilyId,
    pub name: String,
    pub family_type: FamilyType,
    pub parameters: ParameterValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Family {
    /// Create a family with a freshly generated id.
    pub fn new(name: impl Into<String>, family_type: FamilyType, parameters: ParameterValues) -> Self {
        Self {
            family_id: FamilyId::generate(),
            name: name.into(),
            family_type,
            parameters,
            created_at: Some(Utc::now()),
        }
    }

    /// Whether `name` refers to this family (case-insensitive).
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    /// Check that `values` has exactly this family's parameter names and that
    /// every value is in range.
    pub fn check_values(&self, values: &ParameterValues) -> Result<()> {
        let missing: Vec<&str> = self
            .parameters
            .keys()
            .filter(|name| !values.contains_key(*name))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(Error::InvalidParameters(format!(
                "family '{}' requires {}",
                self.name,
                missing.join(", ")
            )));
        }

        let unknown: Vec<&str> = values
            .keys()
            .filter(|name| !self.parameters.contains_key(*name))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(Error::InvalidParameters(format!(
                "family '{}' has no parameter {}",
                self.name,
                unknown.join(", ")
            )));
        }

        check_range(values)
    }
}

/// Reject non-finite values and values below the parameter minimum.
pub fn check_range(values: &ParameterValues) -> Result<()> {
    for (name, value) in values {
        if !value.is_finite() || *value < parameters::MIN_VALUE {
            return Err(Error::InvalidParameters(format!(
                "{} must be a number >= {}, got {}",
                name,
                parameters::MIN_VALUE,
                value
            )));
        }
    }
    Ok(())
}

/// A placed object bound to a family and concrete parameter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Filled from the registry map key on load.
    #[serde(skip)]
    pub instance_id: ObjectId,
    pub family_id: FamilyId,
    pub values: ParameterValues,
}

impl Instance {
    pub fn new(instance_id: ObjectId, family_id: FamilyId, values: ParameterValues) -> Self {
        Self {
            instance_id,
            family_id,
            values,
        }
    }
}
