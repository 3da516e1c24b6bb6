//! Family synchronization.
//!
//! Rebuilds the geometry of every instance of a family. Each instance keeps
//! its own values; the new defaults only apply to future inserts.

use crate::cache::DefinitionCache;
use crate::host::HostDocument;
use crate::model::{FamilyId, Instance, ObjectId, ParameterValues};
use crate::registry::Registry;
use crate::replace::replace_instance_geometry;
use crate::{Error, Result};

/// Outcome of a family synchronization batch.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// `(old_id, new_id)` for every regenerated instance.
    pub rebuilt: Vec<(ObjectId, ObjectId)>,
    /// Bindings dropped because the placed object was gone.
    pub pruned: Vec<ObjectId>,
    /// Instances whose replacement failed, with the reason.
    pub failed: Vec<(ObjectId, Error)>,
}

impl SyncReport {
    /// Instances whose geometry was destroyed without a replacement.
    pub fn lost(&self) -> impl Iterator<Item = &ObjectId> + '_ {
        self.failed
            .iter()
            .filter(|(_, e)| e.is_geometry_lost())
            .map(|(id, _)| id)
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Update a family's defaults and regenerate all of its instances.
///
/// Per-instance failures are recorded in the report and do not stop the
/// batch. The registry is persisted once at the end.
pub fn sync_family_instances(
    registry: &mut Registry,
    doc: &mut dyn HostDocument,
    cache: &DefinitionCache<'_>,
    family_id: &FamilyId,
    new_defaults: ParameterValues,
) -> Result<SyncReport> {
    let family = registry
        .stage_family_parameters(family_id, new_defaults)?
        .clone();

    let bound: Vec<(ObjectId, Instance)> = registry
        .iter_instances_for_family(family_id)
        .map(|(id, instance)| (id.clone(), instance.clone()))
        .collect();

    let mut report = SyncReport::default();
    for (old_id, instance) in bound {
        if doc.find_object(&old_id).is_none() {
            registry.stage_remove(&old_id);
            report.pruned.push(old_id);
            continue;
        }

        match replace_instance_geometry(doc, cache, &old_id, &family, &instance.values) {
            Ok(new_id) if new_id == old_id => report.rebuilt.push((old_id, new_id)),
            Ok(new_id) => match registry.stage_rebind(&old_id, new_id.clone(), instance.values) {
                Ok(()) => report.rebuilt.push((old_id, new_id)),
                Err(e) => {
                    // The old object was already replaced; keep going with the rest.
                    tracing::warn!(family = %family.name, instance = %old_id, new = %new_id, error = %e, "Instance rebind failed");
                    registry.stage_remove(&old_id);
                    report.failed.push((old_id, e));
                }
            },
            Err(e) => {
                tracing::warn!(family = %family.name, instance = %old_id, error = %e, "Instance sync failed");
                if e.is_geometry_lost() {
                    registry.stage_remove(&old_id);
                }
                report.failed.push((old_id, e));
            }
        }
    }

    registry.save()?;
    tracing::info!(
        family = %family.name,
        rebuilt = report.rebuilt.len(),
        pruned = report.pruned.len(),
        failed = report.failed.len(),
        "Family synchronized"
    );
    Ok(report)
}
