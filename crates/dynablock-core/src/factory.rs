//! Geometry factory plugin table.
//!
//! A family's `family_type` tag selects the factory that turns parameter
//! values into shape primitives. Factories are pure: the same values always
//! produce the same shapes.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::family_types;
use crate::geometry::{Point3d, Shape};
use crate::model::{FamilyType, ParameterValues};
use crate::{Error, Result};

/// A parameter a factory understands, with the default offered for new families.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub default: f64,
}

/// Builds shape primitives for one family type.
pub trait GeometryFactory: Send + Sync {
    /// The family type tag this factory serves.
    fn family_type(&self) -> &str;

    /// Parameters in prompt order.
    fn parameters(&self) -> &[ParameterSpec];

    /// Build the ordered shape primitives for `values`.
    fn build(&self, values: &ParameterValues) -> Result<Vec<Shape>>;

    /// Default parameter values for a new family.
    fn default_parameters(&self) -> ParameterValues {
        self.parameters()
            .iter()
            .map(|spec| (spec.name.to_string(), spec.default))
            .collect()
    }
}

/// Shared factory trait object.
pub type DynGeometryFactory = Arc<dyn GeometryFactory>;

fn required(values: &ParameterValues, name: &str) -> Result<f64> {
    values
        .get(name)
        .copied()
        .ok_or_else(|| Error::InvalidParameters(format!("missing parameter {}", name)))
}

/// Planar closed rectangle with its corner at the definition origin.
#[derive(Debug, Default, Clone, Copy)]
pub struct RectangleFactory;

impl RectangleFactory {
    const PARAMETERS: [ParameterSpec; 2] = [
        ParameterSpec {
            name: "Width",
            default: 1.0,
        },
        ParameterSpec {
            name: "Height",
            default: 2.1,
        },
    ];
}

impl GeometryFactory for RectangleFactory {
    fn family_type(&self) -> &str {
        family_types::RECTANGLE
    }

    fn parameters(&self) -> &[ParameterSpec] {
        &Self::PARAMETERS
    }

    fn build(&self, values: &ParameterValues) -> Result<Vec<Shape>> {
        let width = required(values, "Width")?;
        let height = required(values, "Height")?;
        let points = vec![
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(width, 0.0, 0.0),
            Point3d::new(width, height, 0.0),
            Point3d::new(0.0, height, 0.0),
            Point3d::new(0.0, 0.0, 0.0),
        ];
        Ok(vec![Shape::Polyline { points }])
    }
}

/// Registry of geometry factories keyed by family type tag.
#[derive(Clone, Default)]
pub struct FactoryRegistry {
    factories: HashMap<String, DynGeometryFactory>,
}

impl FactoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the factories shipped with the core.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .factories
            .insert(family_types::RECTANGLE.to_string(), Arc::new(RectangleFactory));
        registry
    }

    /// Register a factory under its own family type tag.
    pub fn register(&mut self, factory: DynGeometryFactory) -> Result<()> {
        let tag = factory.family_type().to_string();
        if self.factories.contains_key(&tag) {
            return Err(Error::FactoryAlreadyRegistered(tag));
        }
        tracing::debug!(family_type = %tag, "Registered geometry factory");
        self.factories.insert(tag, factory);
        Ok(())
    }

    /// Look up the factory for a family type.
    pub fn get(&self, family_type: &FamilyType) -> Result<&dyn GeometryFactory> {
        self.factories
            .get(family_type.as_str())
            .map(|f| f.as_ref())
            .ok_or_else(|| Error::UnsupportedFamilyType(family_type.to_string()))
    }

    /// Build shapes for `family_type`.
    pub fn build(&self, family_type: &FamilyType, values: &ParameterValues) -> Result<Vec<Shape>> {
        self.get(family_type)?.build(values)
    }

    /// Registered family type tags, sorted.
    pub fn family_types(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl std::fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("family_types", &self.family_types())
            .finish()
    }
}
