//! Instance replacement protocol.
//!
//! The host cannot reshape a placed instance, so replacement deletes the old
//! object and places a new one with the captured transform and attributes.
//! The new object has a new id; retiring the old id in the registry is the
//! caller's job.

use crate::cache::DefinitionCache;
use crate::host::HostDocument;
use crate::model::{Family, ObjectId, ParameterValues};
use crate::{Error, Result};

/// Swap the geometry of `old_id` for the definition of `(family, values)`.
///
/// `DeleteFailed` leaves the old object in place. `ReplacementLost` means the
/// old object is gone and nothing replaced it.
pub fn replace_instance_geometry(
    doc: &mut dyn HostDocument,
    cache: &DefinitionCache<'_>,
    old_id: &ObjectId,
    family: &Family,
    values: &ParameterValues,
) -> Result<ObjectId> {
    let object = doc
        .find_object(old_id)
        .ok_or_else(|| Error::InstanceNotFound(old_id.clone()))?;
    let placed = object
        .as_placed_instance()
        .ok_or_else(|| Error::NotAnInstance(old_id.clone()))?;

    let transform = placed.transform;
    let attributes = doc.duplicate_attributes(&object);

    // Checks that need no host mutation run before the delete.
    family.check_values(values)?;
    cache.factories().get(&family.family_type)?;

    if !doc.delete_object(&object) {
        return Err(Error::DeleteFailed(old_id.clone()));
    }

    let definition = match cache.ensure_definition(doc, family, values) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(instance = %old_id, error = %e, "Definition unavailable after delete");
            return Err(Error::ReplacementLost(old_id.clone()));
        }
    };

    match doc.create_placed_instance(definition, transform, Some(attributes)) {
        Some(new_id) => {
            tracing::debug!(old = %old_id, new = %new_id, "Instance geometry replaced");
            Ok(new_id)
        }
        None => {
            tracing::warn!(instance = %old_id, "Host returned an empty id for the replacement");
            Err(Error::ReplacementLost(old_id.clone()))
        }
    }
}
