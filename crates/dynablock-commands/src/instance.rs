//! Instance commands: insert and edit.

use dynablock_core::config::MESSAGE_TITLE;
use dynablock_core::{replace_instance_geometry, Error, Result, Transform};

use crate::command::CommandOutcome;
use crate::context::CommandContext;
use crate::family::prompt_values;

/// Place a new instance of a family at a picked point.
pub fn insert_instance(ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    let mut registry = ctx.load_registry();
    if registry.family_count() == 0 {
        ctx.prompt
            .message("No families found. Create one first.", MESSAGE_TITLE);
        return Ok(CommandOutcome::NothingToDo);
    }

    let names = registry.family_names();
    let Some(name) = ctx.prompt.choose(&names, "Pick family", MESSAGE_TITLE) else {
        return Ok(CommandOutcome::Cancelled);
    };
    let Some(family) = registry.find_family_by_name(&name)?.cloned() else {
        return Ok(CommandOutcome::Cancelled);
    };
    let factory = ctx.factories.get(&family.family_type)?;

    let Some(values) = prompt_values(ctx.prompt, factory.parameters(), &family.parameters, "")
    else {
        return Ok(CommandOutcome::Cancelled);
    };
    let Some(point) = ctx.prompt.get_point("Insertion point") else {
        return Ok(CommandOutcome::Cancelled);
    };

    let definition = ctx.cache().ensure_definition(ctx.doc, &family, &values)?;
    let transform = Transform::translation(point.x, point.y, point.z);
    let instance_id = ctx
        .doc
        .create_placed_instance(definition, transform, None)
        .ok_or(Error::PlacementFailed)?;

    registry.add_instance(instance_id.clone(), family.family_id.clone(), values)?;
    ctx.doc.refresh_view();

    Ok(CommandOutcome::Inserted {
        family_id: family.family_id,
        instance_id,
    })
}

/// Change the parameter values of a picked instance.
pub fn edit_instance(ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    let mut registry = ctx.load_registry();

    let Some(old_id) = ctx.prompt.pick_instance("Pick dynamic block instance") else {
        return Ok(CommandOutcome::Cancelled);
    };
    let instance = registry
        .get_instance(&old_id)
        .cloned()
        .ok_or_else(|| Error::NotManaged(old_id.clone()))?;
    let family = registry
        .get_family(&instance.family_id)
        .cloned()
        .ok_or_else(|| Error::MissingFamilyMetadata(old_id.clone()))?;
    let factory = ctx.factories.get(&family.family_type)?;

    let Some(new_values) = prompt_values(ctx.prompt, factory.parameters(), &instance.values, "")
    else {
        return Ok(CommandOutcome::Cancelled);
    };

    let cache = ctx.cache();
    match replace_instance_geometry(ctx.doc, &cache, &old_id, &family, &new_values) {
        Ok(new_id) => {
            registry.rebind_instance(&old_id, new_id.clone(), new_values)?;
            ctx.doc.refresh_view();
            Ok(CommandOutcome::Edited { old_id, new_id })
        }
        Err(e) if e.is_geometry_lost() => {
            registry.remove_instance(&old_id)?;
            ctx.doc.refresh_view();
            Err(e)
        }
        // Deleted outside the commands; the binding points at nothing.
        Err(e @ Error::InstanceNotFound(_)) => {
            registry.remove_instance(&old_id)?;
            Err(e)
        }
        Err(e) => Err(e),
    }
}
