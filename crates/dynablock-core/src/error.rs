//! Error types for the Dynablock core.

use thiserror::Error;

use crate::model::{FamilyId, ObjectId};
use crate::storage::StorageError;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types.
#[derive(Debug, Error)]
pub enum Error {
    /// The persisted registry blob could not be decoded.
    #[error("Registry parse failure: {0}")]
    ParseFailure(String),

    /// A family with the same name (ignoring case) already exists.
    #[error("Family '{0}' already exists")]
    DuplicateFamilyName(String),

    /// More than one family matches a name lookup.
    #[error("Family name '{0}' matches more than one family")]
    AmbiguousFamilyName(String),

    /// No family with the given id.
    #[error("Family not found: {0}")]
    FamilyNotFound(FamilyId),

    /// No geometry factory is registered for the family type.
    #[error("Unsupported family type: {0}")]
    UnsupportedFamilyType(String),

    /// A factory for the family type is already registered.
    #[error("Factory already registered for family type: {0}")]
    FactoryAlreadyRegistered(String),

    /// Parameter values do not fit the family schema or bounds.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// The host document has no object with the given id.
    #[error("Instance not found: {0}")]
    InstanceNotFound(ObjectId),

    /// The host object exists but is not a placed block instance.
    #[error("Object {0} is not a block instance")]
    NotAnInstance(ObjectId),

    /// The placed instance is not tracked by the registry.
    #[error("Instance {0} is not managed by Dynamic Blocks")]
    NotManaged(ObjectId),

    /// The host refused to delete the old instance; nothing changed.
    #[error("Failed to delete instance {0}")]
    DeleteFailed(ObjectId),

    /// The old instance was deleted but no replacement could be created.
    #[error("Instance {0} was deleted but its replacement could not be created")]
    ReplacementLost(ObjectId),

    /// The host returned an empty id for a new placed instance.
    #[error("Failed to create instance")]
    PlacementFailed,

    /// An instance references a family that no longer exists.
    #[error("Family metadata missing for instance {0}")]
    MissingFamilyMetadata(ObjectId),

    /// Host document error.
    #[error("Host error: {0}")]
    Host(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Whether the error left the host document without the geometry it had
    /// before the operation started.
    pub fn is_geometry_lost(&self) -> bool {
        matches!(self, Error::ReplacementLost(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::DuplicateFamilyName("Panel".to_string());
        assert_eq!(err.to_string(), "Family 'Panel' already exists");
    }

    #[test]
    fn test_geometry_lost() {
        let id = ObjectId::new("abc");
        assert!(Error::ReplacementLost(id.clone()).is_geometry_lost());
        assert!(!Error::DeleteFailed(id).is_geometry_lost());
    }

    #[test]
    fn test_storage_error_converts() {
        let err: Error = StorageError::Backend("disk full".to_string()).into();
        assert!(matches!(err, Error::Storage(_)));
        assert!(err.to_string().contains("disk full"));
    }
}
