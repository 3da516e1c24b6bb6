//! Host document boundary.
//!
//! The host owns geometry definitions (reusable shape blocks) and placed
//! objects. It has no primitive for changing the shape of a placed instance:
//! the only way is to delete it and place a new one, which yields a new id.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point3d, Shape, Transform};
use crate::model::ObjectId;
use crate::Result;

/// Handle of a geometry definition inside the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionHandle(pub usize);

impl fmt::Display for DefinitionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Display and attribute state of a host object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectAttributes {
    pub layer: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<[u8; 3]>,
    #[serde(default)]
    pub user_strings: BTreeMap<String, String>,
}

/// A placed instance of a geometry definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedInstance {
    pub id: ObjectId,
    pub definition: DefinitionHandle,
    pub transform: Transform,
    pub attributes: ObjectAttributes,
}

/// An object in the host document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocObject {
    Instance(PlacedInstance),
    Geometry {
        id: ObjectId,
        shape: Shape,
        attributes: ObjectAttributes,
    },
}

impl DocObject {
    pub fn id(&self) -> &ObjectId {
        match self {
            DocObject::Instance(instance) => &instance.id,
            DocObject::Geometry { id, .. } => id,
        }
    }

    pub fn attributes(&self) -> &ObjectAttributes {
        match self {
            DocObject::Instance(instance) => &instance.attributes,
            DocObject::Geometry { attributes, .. } => attributes,
        }
    }

    /// The placed-instance view of this object, if it is one.
    pub fn as_placed_instance(&self) -> Option<&PlacedInstance> {
        match self {
            DocObject::Instance(instance) => Some(instance),
            DocObject::Geometry { .. } => None,
        }
    }
}

/// Operations the core needs from the host CAD document.
pub trait HostDocument {
    /// Find a live geometry definition by exact name.
    fn find_definition(&self, name: &str) -> Option<DefinitionHandle>;

    /// Register a new geometry definition.
    fn create_definition(
        &mut self,
        name: &str,
        description: &str,
        base_point: Point3d,
        shapes: Vec<Shape>,
        attributes: Vec<ObjectAttributes>,
    ) -> Result<DefinitionHandle>;

    /// Find a live object by id.
    fn find_object(&self, id: &ObjectId) -> Option<DocObject>;

    /// Delete an object. Returns `false` if the host refused.
    fn delete_object(&mut self, object: &DocObject) -> bool;

    /// Place an instance of `definition`. `None` is the host's empty id.
    fn create_placed_instance(
        &mut self,
        definition: DefinitionHandle,
        transform: Transform,
        attributes: Option<ObjectAttributes>,
    ) -> Option<ObjectId>;

    /// Copy of the object's display and attribute state.
    fn duplicate_attributes(&self, object: &DocObject) -> ObjectAttributes {
        object.attributes().clone()
    }

    /// Attributes for new geometry created inside definitions.
    fn default_attributes(&self) -> ObjectAttributes {
        ObjectAttributes::default()
    }

    /// Redraw the views.
    fn refresh_view(&mut self);
}
