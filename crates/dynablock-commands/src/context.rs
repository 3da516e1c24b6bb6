//! Everything a command needs to run.

use std::sync::Arc;

use dynablock_core::{DefinitionCache, DocumentStorage, FactoryRegistry, HostDocument, Registry};

use crate::prompt::Prompt;

/// Borrowed handles to the document, its storage, the factories and the user.
pub struct CommandContext<'a> {
    pub storage: Arc<dyn DocumentStorage>,
    pub doc: &'a mut dyn HostDocument,
    pub factories: &'a FactoryRegistry,
    pub prompt: &'a mut dyn Prompt,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        storage: Arc<dyn DocumentStorage>,
        doc: &'a mut dyn HostDocument,
        factories: &'a FactoryRegistry,
        prompt: &'a mut dyn Prompt,
    ) -> Self {
        Self {
            storage,
            doc,
            factories,
            prompt,
        }
    }

    /// Fresh registry read for this command.
    pub fn load_registry(&self) -> Registry {
        Registry::load(self.storage.clone())
    }

    pub fn cache(&self) -> DefinitionCache<'a> {
        DefinitionCache::new(self.factories)
    }
}
