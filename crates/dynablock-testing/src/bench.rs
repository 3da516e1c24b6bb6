//! A document, its storage and the factories, wired together.

use std::sync::Arc;

use dynablock_commands::{run_command, CommandContext, CommandKind, CommandOutcome};
use dynablock_core::{
    replace_instance_geometry, sync_family_instances, DefinitionCache, DefinitionHandle,
    DocumentStorage, Family, FactoryRegistry, FamilyId, HostDocument, ObjectId, ParameterValues,
    Point3d, Registry, Result, SyncReport, Transform,
};
use dynablock_host::SimulatedDocument;
use dynablock_storage::MemoryBackend;

use crate::prompt::{Answer, ScriptedPrompt};

/// Test harness around a [`SimulatedDocument`] and in-memory storage.
pub struct TestBench {
    pub storage: Arc<dyn DocumentStorage>,
    pub doc: SimulatedDocument,
    pub factories: FactoryRegistry,
}

impl Default for TestBench {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBench {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(MemoryBackend::default()),
            doc: SimulatedDocument::new(),
            factories: FactoryRegistry::with_builtins(),
        }
    }

    pub fn registry(&self) -> Registry {
        Registry::load(self.storage.clone())
    }

    pub fn cache(&self) -> DefinitionCache<'_> {
        DefinitionCache::new(&self.factories)
    }

    /// Register `family` directly, bypassing the commands.
    pub fn add_family(&self, family: Family) -> FamilyId {
        let id = family.family_id.clone();
        self.registry()
            .add_family(family)
            .expect("family should be added");
        id
    }

    /// Place an instance at `at` and register it, bypassing the commands.
    pub fn place(&mut self, family_id: &FamilyId, values: ParameterValues, at: Point3d) -> ObjectId {
        let mut registry = self.registry();
        let family = registry
            .get_family(family_id)
            .cloned()
            .expect("family should exist");
        let definition = DefinitionCache::new(&self.factories)
            .ensure_definition(&mut self.doc, &family, &values)
            .expect("definition should build");
        let id = self
            .doc
            .create_placed_instance(definition, Transform::translation(at.x, at.y, at.z), None)
            .expect("placement should succeed");
        registry
            .add_instance(id.clone(), family_id.clone(), values)
            .expect("instance should register");
        id
    }

    pub fn ensure_definition(
        &mut self,
        family: &Family,
        values: &ParameterValues,
    ) -> Result<DefinitionHandle> {
        DefinitionCache::new(&self.factories).ensure_definition(&mut self.doc, family, values)
    }

    pub fn replace(
        &mut self,
        old_id: &ObjectId,
        family: &Family,
        values: &ParameterValues,
    ) -> Result<ObjectId> {
        let cache = DefinitionCache::new(&self.factories);
        replace_instance_geometry(&mut self.doc, &cache, old_id, family, values)
    }

    /// Sync a family against a freshly loaded registry.
    pub fn sync(&mut self, family_id: &FamilyId, defaults: ParameterValues) -> Result<SyncReport> {
        let mut registry = self.registry();
        let cache = DefinitionCache::new(&self.factories);
        sync_family_instances(&mut registry, &mut self.doc, &cache, family_id, defaults)
    }

    /// Run a command with scripted answers.
    pub fn run(
        &mut self,
        kind: CommandKind,
        answers: impl IntoIterator<Item = Answer>,
    ) -> (Result<CommandOutcome>, ScriptedPrompt) {
        let mut prompt = ScriptedPrompt::new(answers);
        let result = {
            let mut ctx =
                CommandContext::new(self.storage.clone(), &mut self.doc, &self.factories, &mut prompt);
            run_command(&mut ctx, kind)
        };
        (result, prompt)
    }
}
