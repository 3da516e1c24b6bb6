//! Geometry definition cache.
//!
//! Definitions live in the host document and are found again by a canonical
//! name derived from the family name and its parameter values, so the cache
//! needs no key store of its own.

use crate::config::definitions;
use crate::factory::FactoryRegistry;
use crate::geometry::Point3d;
use crate::host::{DefinitionHandle, HostDocument, ObjectAttributes};
use crate::model::{Family, ParameterValues};
use crate::Result;

/// Canonical definition name for a family name and parameter values.
///
/// Parameter names are sorted, so the result does not depend on the
/// iteration order of the source map.
pub fn canonical_name<'a, I>(family_name: &str, values: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a f64)>,
{
    let mut pairs: Vec<(&String, &f64)> = values.into_iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let payload = pairs
        .iter()
        .map(|(name, value)| format!("{}={:?}", name, value))
        .collect::<Vec<_>>()
        .join(definitions::SEPARATOR);

    format!(
        "{prefix}{sep}{family}{sep}{payload}",
        prefix = definitions::NAME_PREFIX,
        sep = definitions::SEPARATOR,
        family = family_name,
        payload = payload,
    )
}

/// Resolves or builds host definitions for parameter sets.
#[derive(Debug, Clone, Copy)]
pub struct DefinitionCache<'f> {
    factories: &'f FactoryRegistry,
}

impl<'f> DefinitionCache<'f> {
    pub fn new(factories: &'f FactoryRegistry) -> Self {
        Self { factories }
    }

    pub fn factories(&self) -> &'f FactoryRegistry {
        self.factories
    }

    /// Return the definition for `(family, values)`, creating it on a miss.
    pub fn ensure_definition(
        &self,
        doc: &mut dyn HostDocument,
        family: &Family,
        values: &ParameterValues,
    ) -> Result<DefinitionHandle> {
        family.check_values(values)?;

        let name = canonical_name(&family.name, values);
        if let Some(handle) = doc.find_definition(&name) {
            tracing::debug!(definition = %name, %handle, "Definition cache hit");
            return Ok(handle);
        }

        let shapes = self.factories.build(&family.family_type, values)?;
        let attributes: Vec<ObjectAttributes> =
            shapes.iter().map(|_| doc.default_attributes()).collect();
        let handle = doc.create_definition(
            &name,
            definitions::DESCRIPTION,
            Point3d::ORIGIN,
            shapes,
            attributes,
        )?;
        tracing::debug!(definition = %name, %handle, "Definition cache miss, created");
        Ok(handle)
    }
}
