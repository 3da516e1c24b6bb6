//! Command kinds, outcomes and dispatch.

use std::fmt;
use std::str::FromStr;

use dynablock_core::config::MESSAGE_TITLE;
use dynablock_core::{Error, FamilyId, FamilyType, ObjectId, Result, SyncReport};

use crate::context::CommandContext;
use crate::{family, instance};

/// The commands offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    CreateRectangleFamily,
    InsertInstance,
    EditInstance,
    SyncFamily,
    ListFamilies,
}

impl CommandKind {
    /// All commands in menu order.
    pub const ALL: [CommandKind; 5] = [
        CommandKind::CreateRectangleFamily,
        CommandKind::InsertInstance,
        CommandKind::EditInstance,
        CommandKind::SyncFamily,
        CommandKind::ListFamilies,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::CreateRectangleFamily => "CreateRectangleFamily",
            CommandKind::InsertInstance => "InsertInstance",
            CommandKind::EditInstance => "EditInstance",
            CommandKind::SyncFamily => "SyncFamily",
            CommandKind::ListFamilies => "ListFamilies",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        CommandKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown command: {}", s))
    }
}

/// What a command did.
#[derive(Debug)]
pub enum CommandOutcome {
    /// The user declined a prompt; nothing changed.
    Cancelled,
    /// There was nothing to act on; the user was told why.
    NothingToDo,
    FamilyCreated(FamilyId),
    Inserted {
        family_id: FamilyId,
        instance_id: ObjectId,
    },
    Edited {
        old_id: ObjectId,
        new_id: ObjectId,
    },
    Synced {
        family_id: FamilyId,
        report: SyncReport,
    },
    Listed(usize),
}

/// Text shown to the user when a command fails.
pub fn user_message(err: &Error) -> String {
    match err {
        Error::DuplicateFamilyName(name) => format!("Family '{}' already exists", name),
        Error::NotManaged(_) => "Selected instance is not managed by Dynamic Blocks.".to_string(),
        Error::MissingFamilyMetadata(_) => "Family metadata missing.".to_string(),
        Error::PlacementFailed => "Failed to create instance".to_string(),
        Error::ReplacementLost(id) => format!(
            "Instance {} was deleted but could not be recreated. Its geometry is gone.",
            id
        ),
        Error::InstanceNotFound(_) | Error::NotAnInstance(_) | Error::DeleteFailed(_) => {
            format!("Failed to update instance: {}", err)
        }
        other => other.to_string(),
    }
}

/// Run one command, reporting failures to the user.
pub fn run_command(ctx: &mut CommandContext<'_>, kind: CommandKind) -> Result<CommandOutcome> {
    tracing::debug!(command = %kind, "Running command");
    let result = match kind {
        CommandKind::CreateRectangleFamily => family::create_family(ctx, &FamilyType::rectangle()),
        CommandKind::InsertInstance => instance::insert_instance(ctx),
        CommandKind::EditInstance => instance::edit_instance(ctx),
        CommandKind::SyncFamily => family::sync_family(ctx),
        CommandKind::ListFamilies => family::list_families(ctx),
    };

    match result {
        Ok(outcome) => {
            tracing::info!(command = %kind, ?outcome, "Command finished");
            Ok(outcome)
        }
        Err(e) => {
            if e.is_geometry_lost() {
                tracing::warn!(command = %kind, error = %e, "Command destroyed geometry");
            } else {
                tracing::info!(command = %kind, error = %e, "Command failed");
            }
            ctx.prompt.message(&user_message(&e), MESSAGE_TITLE);
            Err(e)
        }
    }
}

/// Ask which command to run, then run it.
pub fn run_menu(ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    let options: Vec<String> = CommandKind::ALL
        .iter()
        .map(|kind| kind.as_str().to_string())
        .collect();
    let Some(choice) = ctx
        .prompt
        .choose(&options, "Choose Dynamic Blocks action", MESSAGE_TITLE)
    else {
        return Ok(CommandOutcome::Cancelled);
    };
    match choice.parse::<CommandKind>() {
        Ok(kind) => run_command(ctx, kind),
        Err(_) => Ok(CommandOutcome::Cancelled),
    }
}
