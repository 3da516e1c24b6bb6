//! Family commands: create, sync and list.

use std::fmt::Write;

use dynablock_core::config::{parameters, MESSAGE_TITLE};
use dynablock_core::{
    sync_family_instances, Family, FamilyType, GeometryFactory, ParameterSpec, ParameterValues,
    Result,
};

use crate::command::CommandOutcome;
use crate::context::CommandContext;
use crate::prompt::Prompt;

/// Ask for every parameter, in factory order, starting from `current`.
///
/// Parameters the factory does not declare but `current` holds are asked
/// for afterwards in name order.
pub(crate) fn prompt_values(
    prompt: &mut dyn Prompt,
    specs: &[ParameterSpec],
    current: &ParameterValues,
    label_prefix: &str,
) -> Option<ParameterValues> {
    let mut order: Vec<&str> = specs
        .iter()
        .map(|spec| spec.name)
        .filter(|name| current.contains_key(*name))
        .collect();
    for name in current.keys() {
        if !order.contains(&name.as_str()) {
            order.push(name);
        }
    }

    let mut values = ParameterValues::new();
    for name in order {
        let label = format!("{}{}", label_prefix, name);
        let entered = prompt.get_real(&label, current[name], parameters::MIN_VALUE)?;
        values.insert(name.to_string(), parameters::round_value(entered));
    }
    Some(values)
}

/// Create a family of `family_type` from prompted name and defaults.
pub fn create_family(ctx: &mut CommandContext<'_>, family_type: &FamilyType) -> Result<CommandOutcome> {
    let factory: &dyn GeometryFactory = ctx.factories.get(family_type)?;

    let Some(name) = ctx.prompt.get_string("Family name", Some("DoorPanel")) else {
        return Ok(CommandOutcome::Cancelled);
    };
    let name = name.trim().to_string();
    if name.is_empty() {
        return Ok(CommandOutcome::Cancelled);
    }

    let Some(defaults) = prompt_values(
        ctx.prompt,
        factory.parameters(),
        &factory.default_parameters(),
        "Default ",
    ) else {
        return Ok(CommandOutcome::Cancelled);
    };

    let mut registry = ctx.load_registry();
    let family = Family::new(name, family_type.clone(), defaults);
    let family_id = family.family_id.clone();
    let message = format!("Created family '{}'", family.name);
    registry.add_family(family)?;

    ctx.prompt.message(&message, MESSAGE_TITLE);
    Ok(CommandOutcome::FamilyCreated(family_id))
}

/// Change a family's defaults and regenerate all of its instances.
pub fn sync_family(ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    let mut registry = ctx.load_registry();
    if registry.family_count() == 0 {
        ctx.prompt.message("No families available.", MESSAGE_TITLE);
        return Ok(CommandOutcome::NothingToDo);
    }

    let names = registry.family_names();
    let Some(name) = ctx
        .prompt
        .choose(&names, "Pick family to update all instances", MESSAGE_TITLE)
    else {
        return Ok(CommandOutcome::Cancelled);
    };
    let Some(family) = registry.find_family_by_name(&name)?.cloned() else {
        return Ok(CommandOutcome::Cancelled);
    };
    let factory = ctx.factories.get(&family.family_type)?;

    let Some(new_defaults) = prompt_values(
        ctx.prompt,
        factory.parameters(),
        &family.parameters,
        "New default ",
    ) else {
        return Ok(CommandOutcome::Cancelled);
    };

    let cache = ctx.cache();
    let report = sync_family_instances(&mut registry, ctx.doc, &cache, &family.family_id, new_defaults)?;
    ctx.doc.refresh_view();

    let mut message = format!("Family '{}' synchronized.", family.name);
    if !report.pruned.is_empty() {
        let _ = write!(message, "\n{} deleted instance(s) removed.", report.pruned.len());
    }
    if !report.is_clean() {
        let _ = write!(message, "\n{} instance(s) could not be updated.", report.failed.len());
        let lost = report.lost().count();
        if lost > 0 {
            let _ = write!(message, "\n{} instance(s) lost their geometry.", lost);
        }
    }
    ctx.prompt.message(&message, MESSAGE_TITLE);

    Ok(CommandOutcome::Synced {
        family_id: family.family_id,
        report,
    })
}

/// Show every family with its defaults and instance count.
///
/// Bindings whose objects no longer exist are dropped first so the counts
/// match the document.
pub fn list_families(ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    let mut registry = ctx.load_registry();
    registry.prune_stale(&*ctx.doc)?;
    if registry.family_count() == 0 {
        ctx.prompt.message("No families found. Create one first.", MESSAGE_TITLE);
        return Ok(CommandOutcome::Listed(0));
    }

    let mut families: Vec<&Family> = registry.families().collect();
    families.sort_by(|a, b| a.name.cmp(&b.name));

    let mut text = String::new();
    for family in &families {
        let count = registry.iter_instances_for_family(&family.family_id).count();
        let defaults = family
            .parameters
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(
            text,
            "{} ({}): {} instance(s), defaults {}",
            family.name, family.family_type, count, defaults
        );
    }
    ctx.prompt.message(text.trim_end(), MESSAGE_TITLE);
    Ok(CommandOutcome::Listed(families.len()))
}
