//! Core traits and types for Dynablock.
//!
//! This crate owns the parametric instance management core: the persisted
//! family/instance registry, the geometry definition cache, the instance
//! replacement protocol and family synchronization. The host CAD document,
//! its string storage and the geometry factories are reached through traits.

pub mod cache;
pub mod config;
pub mod error;
pub mod factory;
pub mod geometry;
pub mod host;
pub mod model;
pub mod registry;
pub mod replace;
pub mod storage;
pub mod sync;

pub use cache::{canonical_name, DefinitionCache};
pub use error::{Error, Result};
pub use factory::{FactoryRegistry, GeometryFactory, ParameterSpec, RectangleFactory};
pub use geometry::{Point3d, Shape, Transform};
pub use host::{DefinitionHandle, DocObject, HostDocument, ObjectAttributes, PlacedInstance};
pub use model::{Family, FamilyId, FamilyType, Instance, ObjectId, ParameterValues};
pub use registry::{Registry, RegistryData};
pub use replace::replace_instance_geometry;
pub use storage::{DocumentStorage, StorageError};
pub use sync::{sync_family_instances, SyncReport};

/// Re-exports commonly used types.
pub mod prelude {
    pub use crate::error::{Error, Result};

    pub use crate::model::{Family, FamilyId, FamilyType, Instance, ObjectId, ParameterValues};

    pub use crate::factory::{FactoryRegistry, GeometryFactory, ParameterSpec};
    pub use crate::geometry::{Point3d, Shape, Transform};

    pub use crate::host::{DefinitionHandle, DocObject, HostDocument, ObjectAttributes};
    pub use crate::storage::{DocumentStorage, StorageError};

    pub use crate::cache::DefinitionCache;
    pub use crate::registry::Registry;
    pub use crate::replace::replace_instance_geometry;
    pub use crate::sync::{sync_family_instances, SyncReport};
}
