//! Persistent family and instance registry.
//!
//! The registry is loaded from document storage at the start of every
//! operation and written back in full after every mutation. A missing or
//! unreadable blob loads as an empty registry so that bad bookkeeping never
//! blocks the user; geometry already in the document is left alone.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::store;
use crate::host::HostDocument;
use crate::model::{Family, FamilyId, Instance, ObjectId, ParameterValues};
use crate::storage::DocumentStorage;
use crate::{Error, Result};

/// The serialized registry state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryData {
    #[serde(default)]
    pub families: BTreeMap<FamilyId, Family>,
    #[serde(default)]
    pub instances: BTreeMap<ObjectId, Instance>,
}

impl RegistryData {
    /// Decode a registry blob.
    pub fn decode(raw: &str) -> Result<Self> {
        let mut data: RegistryData =
            serde_json::from_str(raw).map_err(|e| Error::ParseFailure(e.to_string()))?;
        for (id, family) in data.families.iter_mut() {
            family.family_id = id.clone();
        }
        for (id, instance) in data.instances.iter_mut() {
            instance.instance_id = id.clone();
        }
        Ok(data)
    }

    /// Encode the registry as a JSON blob.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Family catalog and instance bindings backed by document storage.
pub struct Registry {
    storage: Arc<dyn DocumentStorage>,
    data: RegistryData,
}

impl Registry {
    /// Load the registry, falling back to an empty one.
    pub fn load(storage: Arc<dyn DocumentStorage>) -> Self {
        let data = match storage.get(store::SECTION, store::KEY) {
            Ok(Some(raw)) if !raw.trim().is_empty() => match RegistryData::decode(&raw) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding unreadable registry, starting empty");
                    RegistryData::default()
                }
            },
            Ok(_) => RegistryData::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Registry storage unavailable, starting empty");
                RegistryData::default()
            }
        };
        tracing::debug!(
            families = data.families.len(),
            instances = data.instances.len(),
            "Registry loaded"
        );
        Self { storage, data }
    }

    /// Write the full state to storage, replacing the previous blob.
    pub fn save(&self) -> Result<()> {
        let raw = self.data.encode()?;
        self.storage.set(store::SECTION, store::KEY, &raw)?;
        tracing::debug!(bytes = raw.len(), "Registry saved");
        Ok(())
    }

    pub fn data(&self) -> &RegistryData {
        &self.data
    }

    /// Persist, or put `snapshot` back if the write fails.
    fn commit(&mut self, snapshot: RegistryData) -> Result<()> {
        if let Err(e) = self.save() {
            tracing::warn!(error = %e, "Registry write failed, changes discarded");
            self.data = snapshot;
            return Err(e);
        }
        Ok(())
    }

    // ========== Families ==========

    /// Add a family. Names are unique ignoring case.
    pub fn add_family(&mut self, family: Family) -> Result<()> {
        if self.data.families.values().any(|f| f.matches_name(&family.name)) {
            return Err(Error::DuplicateFamilyName(family.name));
        }
        let snapshot = self.data.clone();
        tracing::info!(family = %family.name, id = %family.family_id, "Family added");
        self.data.families.insert(family.family_id.clone(), family);
        self.commit(snapshot)
    }

    pub fn get_family(&self, id: &FamilyId) -> Option<&Family> {
        self.data.families.get(id)
    }

    /// Find a family by name, ignoring case.
    ///
    /// Creation keeps names unique, so more than one match means the stored
    /// state was edited outside this registry; that is reported rather than
    /// resolved by picking one.
    pub fn find_family_by_name(&self, name: &str) -> Result<Option<&Family>> {
        let mut matches = self.data.families.values().filter(|f| f.matches_name(name));
        let first = matches.next();
        if matches.next().is_some() {
            return Err(Error::AmbiguousFamilyName(name.to_string()));
        }
        Ok(first)
    }

    pub fn families(&self) -> impl Iterator<Item = &Family> + '_ {
        self.data.families.values()
    }

    /// Family names in display order.
    pub fn family_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.data.families.values().map(|f| f.name.clone()).collect();
        names.sort();
        names
    }

    pub fn family_count(&self) -> usize {
        self.data.families.len()
    }

    /// Replace a family's default parameters without persisting.
    pub(crate) fn stage_family_parameters(
        &mut self,
        id: &FamilyId,
        parameters: ParameterValues,
    ) -> Result<&Family> {
        let family = self
            .data
            .families
            .get_mut(id)
            .ok_or_else(|| Error::FamilyNotFound(id.clone()))?;
        family.check_values(&parameters)?;
        family.parameters = parameters;
        Ok(family)
    }

    // ========== Instances ==========

    /// Bind a placed object to a family.
    pub fn add_instance(
        &mut self,
        id: ObjectId,
        family_id: FamilyId,
        values: ParameterValues,
    ) -> Result<()> {
        let snapshot = self.data.clone();
        self.stage_instance(id, family_id, values)?;
        self.commit(snapshot)
    }

    pub fn get_instance(&self, id: &ObjectId) -> Option<&Instance> {
        self.data.instances.get(id)
    }

    /// Remove an instance binding. Absent ids are a no-op.
    pub fn remove_instance(&mut self, id: &ObjectId) -> Result<Option<Instance>> {
        if !self.data.instances.contains_key(id) {
            return Ok(None);
        }
        let snapshot = self.data.clone();
        let removed = self.data.instances.remove(id);
        self.commit(snapshot)?;
        Ok(removed)
    }

    /// Retire `old_id` and bind `new_id` to the same family with `values`,
    /// persisting once.
    pub fn rebind_instance(
        &mut self,
        old_id: &ObjectId,
        new_id: ObjectId,
        values: ParameterValues,
    ) -> Result<()> {
        let snapshot = self.data.clone();
        self.stage_rebind(old_id, new_id, values)?;
        self.commit(snapshot)
    }

    /// Instances bound to `family_id`.
    ///
    /// The iterator borrows the registry; collect it before mutating.
    pub fn iter_instances_for_family<'a>(
        &'a self,
        family_id: &'a FamilyId,
    ) -> impl Iterator<Item = (&'a ObjectId, &'a Instance)> + 'a {
        self.data
            .instances
            .iter()
            .filter(move |(_, instance)| &instance.family_id == family_id)
    }

    pub fn instance_count(&self) -> usize {
        self.data.instances.len()
    }

    /// Drop bindings whose placed object is gone from the document.
    pub fn prune_stale(&mut self, doc: &dyn HostDocument) -> Result<Vec<ObjectId>> {
        let stale: Vec<ObjectId> = self
            .data
            .instances
            .keys()
            .filter(|id| doc.find_object(id).is_none())
            .cloned()
            .collect();
        if stale.is_empty() {
            return Ok(stale);
        }
        let snapshot = self.data.clone();
        for id in &stale {
            self.data.instances.remove(id);
        }
        self.commit(snapshot)?;
        tracing::info!(count = stale.len(), "Pruned stale instances");
        Ok(stale)
    }

    pub(crate) fn stage_instance(
        &mut self,
        id: ObjectId,
        family_id: FamilyId,
        values: ParameterValues,
    ) -> Result<()> {
        let family = self
            .data
            .families
            .get(&family_id)
            .ok_or_else(|| Error::FamilyNotFound(family_id.clone()))?;
        family.check_values(&values)?;
        let instance = Instance::new(id.clone(), family_id, values);
        self.data.instances.insert(id, instance);
        Ok(())
    }

    pub(crate) fn stage_rebind(
        &mut self,
        old_id: &ObjectId,
        new_id: ObjectId,
        values: ParameterValues,
    ) -> Result<()> {
        let family_id = self
            .data
            .instances
            .get(old_id)
            .map(|instance| instance.family_id.clone())
            .ok_or_else(|| Error::NotManaged(old_id.clone()))?;
        let family = self
            .data
            .families
            .get(&family_id)
            .ok_or_else(|| Error::MissingFamilyMetadata(old_id.clone()))?;
        family.check_values(&values)?;

        self.data.instances.remove(old_id);
        tracing::debug!(old = %old_id, new = %new_id, "Instance rebound");
        self.data
            .instances
            .insert(new_id.clone(), Instance::new(new_id, family_id, values));
        Ok(())
    }

    pub(crate) fn stage_remove(&mut self, id: &ObjectId) -> Option<Instance> {
        self.data.instances.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FamilyType;
    use crate::storage::{Result as StorageResult, StorageError};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapStorage {
        values: Mutex<HashMap<(String, String), String>>,
        broken: bool,
        read_only: bool,
    }

    impl DocumentStorage for MapStorage {
        fn get(&self, section: &str, key: &str) -> StorageResult<Option<String>> {
            if self.broken {
                return Err(StorageError::Backend("unavailable".to_string()));
            }
            let values = self.values.lock().unwrap();
            Ok(values.get(&(section.to_string(), key.to_string())).cloned())
        }

        fn set(&self, section: &str, key: &str, value: &str) -> StorageResult<()> {
            if self.read_only {
                return Err(StorageError::Backend("read-only".to_string()));
            }
            self.values
                .lock()
                .unwrap()
                .insert((section.to_string(), key.to_string()), value.to_string());
            Ok(())
        }

        fn is_persistent(&self) -> bool {
            false
        }
    }

    fn storage_with(raw: &str) -> Arc<dyn DocumentStorage> {
        let storage = MapStorage::default();
        storage.set(store::SECTION, store::KEY, raw).unwrap();
        Arc::new(storage)
    }

    fn panel_values(width: f64, height: f64) -> ParameterValues {
        let mut values = ParameterValues::new();
        values.insert("Width".to_string(), width);
        values.insert("Height".to_string(), height);
        values
    }

    fn panel() -> Family {
        Family::new("Panel", FamilyType::rectangle(), panel_values(1.0, 2.1))
    }

    #[test]
    fn test_load_empty_storage() {
        let registry = Registry::load(Arc::new(MapStorage::default()));
        assert_eq!(registry.data(), &RegistryData::default());
    }

    #[test]
    fn test_load_corrupted_blob() {
        let registry = Registry::load(storage_with("{not json"));
        assert_eq!(registry.family_count(), 0);
        assert_eq!(registry.instance_count(), 0);
    }

    #[test]
    fn test_load_unavailable_storage() {
        let storage = MapStorage {
            broken: true,
            ..Default::default()
        };
        let registry = Registry::load(Arc::new(storage));
        assert_eq!(registry.family_count(), 0);
    }

    #[test]
    fn test_load_defaults_missing_sections() {
        let registry = Registry::load(storage_with(r#"{"families": {}}"#));
        assert_eq!(registry.instance_count(), 0);
    }

    #[test]
    fn test_load_original_blob_layout() {
        let raw = r#"{
            "families": {"f1": {"name": "Door", "family_type": "rectangle",
                                "parameters": {"Width": 0.9, "Height": 2.1}}},
            "instances": {"o1": {"family_id": "f1", "values": {"Width": 0.8, "Height": 2.0}}}
        }"#;
        let registry = Registry::load(storage_with(raw));
        let family = registry.get_family(&FamilyId::new("f1")).unwrap();
        assert_eq!(family.family_id.as_str(), "f1");
        assert!(family.created_at.is_none());
        let instance = registry.get_instance(&ObjectId::new("o1")).unwrap();
        assert_eq!(instance.instance_id.as_str(), "o1");
        assert_eq!(instance.values["Width"], 0.8);
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let storage: Arc<dyn DocumentStorage> = Arc::new(MapStorage::default());
        let mut registry = Registry::load(storage.clone());
        let family = panel();
        let family_id = family.family_id.clone();
        registry.add_family(family).unwrap();
        registry
            .add_instance(ObjectId::new("o1"), family_id, panel_values(1.2, 2.0))
            .unwrap();

        let reloaded = Registry::load(storage);
        assert_eq!(reloaded.data(), registry.data());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let storage: Arc<dyn DocumentStorage> = Arc::new(MapStorage::default());
        let mut registry = Registry::load(storage);
        registry.add_family(panel()).unwrap();
        let before = registry.data().clone();

        let dup = Family::new("PANEL", FamilyType::rectangle(), panel_values(3.0, 3.0));
        let result = registry.add_family(dup);
        assert!(matches!(result, Err(Error::DuplicateFamilyName(_))));
        assert_eq!(registry.data(), &before);
    }

    #[test]
    fn test_find_family_by_name() {
        let mut registry = Registry::load(Arc::new(MapStorage::default()));
        registry.add_family(panel()).unwrap();
        let found = registry.find_family_by_name("panel").unwrap().unwrap();
        assert_eq!(found.name, "Panel");
        assert!(registry.find_family_by_name("Door").unwrap().is_none());
    }

    #[test]
    fn test_find_family_flags_duplicates() {
        let raw = r#"{"families": {
            "a": {"name": "Panel", "family_type": "rectangle", "parameters": {}},
            "b": {"name": "panel", "family_type": "rectangle", "parameters": {}}
        }}"#;
        let registry = Registry::load(storage_with(raw));
        assert!(matches!(
            registry.find_family_by_name("PANEL"),
            Err(Error::AmbiguousFamilyName(_))
        ));
    }

    #[test]
    fn test_add_instance_requires_family_and_schema() {
        let mut registry = Registry::load(Arc::new(MapStorage::default()));
        let result = registry.add_instance(
            ObjectId::new("o1"),
            FamilyId::new("missing"),
            panel_values(1.0, 1.0),
        );
        assert!(matches!(result, Err(Error::FamilyNotFound(_))));

        let family = panel();
        let family_id = family.family_id.clone();
        registry.add_family(family).unwrap();
        let mut values = panel_values(1.0, 1.0);
        values.remove("Height");
        let result = registry.add_instance(ObjectId::new("o1"), family_id, values);
        assert!(matches!(result, Err(Error::InvalidParameters(_))));
        assert_eq!(registry.instance_count(), 0);
    }

    #[test]
    fn test_remove_absent_instance_is_noop() {
        let mut registry = Registry::load(Arc::new(MapStorage::default()));
        assert!(registry.remove_instance(&ObjectId::new("nope")).unwrap().is_none());
    }

    #[test]
    fn test_rebind_instance_swaps_identity() {
        let storage: Arc<dyn DocumentStorage> = Arc::new(MapStorage::default());
        let mut registry = Registry::load(storage.clone());
        let family = panel();
        let family_id = family.family_id.clone();
        registry.add_family(family).unwrap();
        registry
            .add_instance(ObjectId::new("old"), family_id.clone(), panel_values(1.0, 2.1))
            .unwrap();

        registry
            .rebind_instance(&ObjectId::new("old"), ObjectId::new("new"), panel_values(1.5, 2.1))
            .unwrap();

        let reloaded = Registry::load(storage);
        assert!(reloaded.get_instance(&ObjectId::new("old")).is_none());
        let instance = reloaded.get_instance(&ObjectId::new("new")).unwrap();
        assert_eq!(instance.family_id, family_id);
        assert_eq!(instance.values, panel_values(1.5, 2.1));
    }

    #[test]
    fn test_iter_instances_for_family() {
        let mut registry = Registry::load(Arc::new(MapStorage::default()));
        let a = panel();
        let b = Family::new("Door", FamilyType::rectangle(), panel_values(0.9, 2.0));
        let (a_id, b_id) = (a.family_id.clone(), b.family_id.clone());
        registry.add_family(a).unwrap();
        registry.add_family(b).unwrap();
        registry
            .add_instance(ObjectId::new("1"), a_id.clone(), panel_values(1.0, 1.0))
            .unwrap();
        registry
            .add_instance(ObjectId::new("2"), b_id, panel_values(1.0, 1.0))
            .unwrap();
        registry
            .add_instance(ObjectId::new("3"), a_id.clone(), panel_values(2.0, 1.0))
            .unwrap();

        let ids: Vec<&str> = registry
            .iter_instances_for_family(&a_id)
            .map(|(id, _)| id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_family_names_sorted() {
        let mut registry = Registry::load(Arc::new(MapStorage::default()));
        registry
            .add_family(Family::new("Window", FamilyType::rectangle(), panel_values(1.0, 1.0)))
            .unwrap();
        registry.add_family(panel()).unwrap();
        assert_eq!(registry.family_names(), vec!["Panel", "Window"]);
    }

    #[test]
    fn test_failed_write_leaves_registry_unchanged() {
        let storage = MapStorage {
            read_only: true,
            ..Default::default()
        };
        let mut registry = Registry::load(Arc::new(storage));

        let result = registry.add_family(panel());

        assert!(matches!(result, Err(Error::Storage(_))));
        assert_eq!(registry.family_count(), 0);
        assert!(registry.find_family_by_name("Panel").unwrap().is_none());
    }

    #[test]
    fn test_failed_remove_keeps_binding() {
        let raw = r#"{
            "families": {"f1": {"name": "Door", "family_type": "rectangle",
                                "parameters": {"Width": 0.9, "Height": 2.1}}},
            "instances": {"o1": {"family_id": "f1", "values": {"Width": 0.8, "Height": 2.0}}}
        }"#;
        let mut values = HashMap::new();
        values.insert((store::SECTION.to_string(), store::KEY.to_string()), raw.to_string());
        let storage = MapStorage {
            values: Mutex::new(values),
            read_only: true,
            ..Default::default()
        };
        let mut registry = Registry::load(Arc::new(storage));

        assert!(registry.remove_instance(&ObjectId::new("o1")).is_err());
        assert!(registry.get_instance(&ObjectId::new("o1")).is_some());
    }
}
