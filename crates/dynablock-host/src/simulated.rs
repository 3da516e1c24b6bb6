//! In-process host document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use dynablock_core::host::{DefinitionHandle, DocObject, HostDocument, ObjectAttributes, PlacedInstance};
use dynablock_core::storage::DocumentStorage;
use dynablock_core::{Error, ObjectId, Point3d, Result, Shape, Transform};

/// Section of the document string table that holds the simulated document.
pub const STORE_SECTION: &str = "DynamicBlocksHost";
/// Key of the simulated document blob.
pub const STORE_KEY: &str = "Document";

/// A geometry definition stored in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceDefinition {
    pub name: String,
    pub description: String,
    pub base_point: Point3d,
    pub shapes: Vec<Shape>,
    pub attributes: Vec<ObjectAttributes>,
}

/// One-shot failures to inject into the next host call of each kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    pub fail_next_delete: bool,
    pub fail_next_placement: bool,
    pub fail_next_definition: bool,
}

/// Host document kept entirely in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulatedDocument {
    #[serde(default)]
    definitions: Vec<InstanceDefinition>,
    #[serde(default)]
    objects: BTreeMap<ObjectId, DocObject>,
    #[serde(default = "default_layer")]
    current_layer: String,
    #[serde(skip)]
    faults: Faults,
    #[serde(skip)]
    redraws: usize,
}

fn default_layer() -> String {
    "Default".to_string()
}

fn new_object_id() -> ObjectId {
    ObjectId::new(uuid::Uuid::new_v4().to_string())
}

impl SimulatedDocument {
    pub fn new() -> Self {
        Self {
            current_layer: default_layer(),
            ..Default::default()
        }
    }

    /// Load the document persisted in `storage`, or start a new one.
    pub fn load(storage: &dyn DocumentStorage) -> Self {
        match storage.get(STORE_SECTION, STORE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding unreadable document, starting empty");
                    Self::new()
                }
            },
            Ok(None) => Self::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Document storage unavailable, starting empty");
                Self::new()
            }
        }
    }

    /// Persist the document into `storage`.
    pub fn save(&self, storage: &dyn DocumentStorage) -> Result<()> {
        let raw = serde_json::to_string(self)?;
        storage.set(STORE_SECTION, STORE_KEY, &raw)?;
        Ok(())
    }

    pub fn faults_mut(&mut self) -> &mut Faults {
        &mut self.faults
    }

    pub fn set_current_layer(&mut self, layer: impl Into<String>) {
        self.current_layer = layer.into();
    }

    pub fn definition_count(&self) -> usize {
        self.definitions.len()
    }

    pub fn definition(&self, handle: DefinitionHandle) -> Option<&InstanceDefinition> {
        self.definitions.get(handle.0)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn objects(&self) -> impl Iterator<Item = &DocObject> + '_ {
        self.objects.values()
    }

    pub fn redraw_count(&self) -> usize {
        self.redraws
    }

    /// Add a loose curve that is not a block instance.
    pub fn add_curve(&mut self, shape: Shape) -> ObjectId {
        let id = new_object_id();
        let object = DocObject::Geometry {
            id: id.clone(),
            shape,
            attributes: self.default_attributes(),
        };
        self.objects.insert(id.clone(), object);
        id
    }

    /// Remove an object the way a user deleting it by hand would.
    pub fn remove_externally(&mut self, id: &ObjectId) -> bool {
        self.objects.remove(id).is_some()
    }

    /// Set attributes on an existing object.
    pub fn set_attributes(&mut self, id: &ObjectId, attributes: ObjectAttributes) -> bool {
        match self.objects.get_mut(id) {
            Some(DocObject::Instance(instance)) => {
                instance.attributes = attributes;
                true
            }
            Some(DocObject::Geometry { attributes: a, .. }) => {
                *a = attributes;
                true
            }
            None => false,
        }
    }

    /// Geometry of a placed instance in world coordinates.
    pub fn world_shapes(&self, id: &ObjectId) -> Option<Vec<Shape>> {
        let placed = self.objects.get(id)?.as_placed_instance()?;
        let definition = self.definitions.get(placed.definition.0)?;
        let to_origin = Transform::translation(
            -definition.base_point.x,
            -definition.base_point.y,
            -definition.base_point.z,
        );
        let xform = placed.transform.then(&to_origin);
        Some(definition.shapes.iter().map(|s| s.transformed(&xform)).collect())
    }
}

impl HostDocument for SimulatedDocument {
    fn find_definition(&self, name: &str) -> Option<DefinitionHandle> {
        self.definitions
            .iter()
            .position(|d| d.name == name)
            .map(DefinitionHandle)
    }

    fn create_definition(
        &mut self,
        name: &str,
        description: &str,
        base_point: Point3d,
        shapes: Vec<Shape>,
        attributes: Vec<ObjectAttributes>,
    ) -> Result<DefinitionHandle> {
        if std::mem::take(&mut self.faults.fail_next_definition) {
            return Err(Error::Host(format!("could not add definition {}", name)));
        }
        if self.find_definition(name).is_some() {
            return Err(Error::Host(format!("definition {} already exists", name)));
        }
        if shapes.len() != attributes.len() {
            return Err(Error::Host(format!(
                "definition {} has {} shapes but {} attribute sets",
                name,
                shapes.len(),
                attributes.len()
            )));
        }
        self.definitions.push(InstanceDefinition {
            name: name.to_string(),
            description: description.to_string(),
            base_point,
            shapes,
            attributes,
        });
        Ok(DefinitionHandle(self.definitions.len() - 1))
    }

    fn find_object(&self, id: &ObjectId) -> Option<DocObject> {
        self.objects.get(id).cloned()
    }

    fn delete_object(&mut self, object: &DocObject) -> bool {
        if std::mem::take(&mut self.faults.fail_next_delete) {
            return false;
        }
        self.objects.remove(object.id()).is_some()
    }

    fn create_placed_instance(
        &mut self,
        definition: DefinitionHandle,
        transform: Transform,
        attributes: Option<ObjectAttributes>,
    ) -> Option<ObjectId> {
        if std::mem::take(&mut self.faults.fail_next_placement) {
            return None;
        }
        self.definitions.get(definition.0)?;

        let id = new_object_id();
        let attributes = attributes.unwrap_or_else(|| self.default_attributes());
        self.objects.insert(
            id.clone(),
            DocObject::Instance(PlacedInstance {
                id: id.clone(),
                definition,
                transform,
                attributes,
            }),
        );
        Some(id)
    }

    fn default_attributes(&self) -> ObjectAttributes {
        ObjectAttributes {
            layer: self.current_layer.clone(),
            ..Default::default()
        }
    }

    fn refresh_view(&mut self) {
        self.redraws += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynablock_storage::MemoryBackend;

    fn square() -> Vec<Shape> {
        vec![Shape::Polyline {
            points: vec![
                Point3d::new(0.0, 0.0, 0.0),
                Point3d::new(1.0, 0.0, 0.0),
                Point3d::new(1.0, 1.0, 0.0),
                Point3d::new(0.0, 0.0, 0.0),
            ],
        }]
    }

    fn add_square(doc: &mut SimulatedDocument, name: &str) -> DefinitionHandle {
        let attrs = vec![doc.default_attributes()];
        doc.create_definition(name, "test", Point3d::ORIGIN, square(), attrs)
            .unwrap()
    }

    #[test]
    fn test_definitions_are_found_by_name() {
        let mut doc = SimulatedDocument::new();
        let handle = add_square(&mut doc, "DB_Sq_Side=1.0");
        assert_eq!(doc.find_definition("DB_Sq_Side=1.0"), Some(handle));
        assert_eq!(doc.find_definition("DB_Sq_Side=2.0"), None);
        assert_eq!(doc.definition_count(), 1);
    }

    #[test]
    fn test_duplicate_definition_rejected() {
        let mut doc = SimulatedDocument::new();
        add_square(&mut doc, "A");
        let attrs = vec![doc.default_attributes()];
        let result = doc.create_definition("A", "test", Point3d::ORIGIN, square(), attrs);
        assert!(matches!(result, Err(Error::Host(_))));
    }

    #[test]
    fn test_place_and_delete() {
        let mut doc = SimulatedDocument::new();
        let handle = add_square(&mut doc, "A");
        let id = doc
            .create_placed_instance(handle, Transform::translation(5.0, 0.0, 0.0), None)
            .unwrap();
        let object = doc.find_object(&id).unwrap();
        assert_eq!(object.attributes().layer, "Default");

        let world = doc.world_shapes(&id).unwrap();
        assert_eq!(world[0].points()[1], Point3d::new(6.0, 0.0, 0.0));

        assert!(doc.delete_object(&object));
        assert!(doc.find_object(&id).is_none());
    }

    #[test]
    fn test_placement_needs_definition() {
        let mut doc = SimulatedDocument::new();
        assert!(doc
            .create_placed_instance(DefinitionHandle(3), Transform::identity(), None)
            .is_none());
    }

    #[test]
    fn test_faults_fire_once() {
        let mut doc = SimulatedDocument::new();
        let handle = add_square(&mut doc, "A");
        doc.faults_mut().fail_next_placement = true;
        assert!(doc
            .create_placed_instance(handle, Transform::identity(), None)
            .is_none());
        let id = doc
            .create_placed_instance(handle, Transform::identity(), None)
            .unwrap();

        doc.faults_mut().fail_next_delete = true;
        let object = doc.find_object(&id).unwrap();
        assert!(!doc.delete_object(&object));
        assert!(doc.delete_object(&object));
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryBackend::default();
        let mut doc = SimulatedDocument::new();
        let handle = add_square(&mut doc, "A");
        let id = doc
            .create_placed_instance(handle, Transform::identity(), None)
            .unwrap();
        doc.add_curve(square().remove(0));
        doc.save(&storage).unwrap();

        let loaded = SimulatedDocument::load(&storage);
        assert_eq!(loaded.definition_count(), 1);
        assert_eq!(loaded.object_count(), 2);
        assert!(loaded.find_object(&id).unwrap().as_placed_instance().is_some());
    }

    #[test]
    fn test_load_corrupted_document() {
        let storage = MemoryBackend::default();
        storage.set(STORE_SECTION, STORE_KEY, "[1, 2").unwrap();
        let doc = SimulatedDocument::load(&storage);
        assert_eq!(doc.object_count(), 0);
    }
}
