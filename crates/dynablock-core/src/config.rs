//! Shared defaults and constants.
//!
//! Every crate in the workspace reads its fixed names and limits from here so
//! that the persisted layout and the user-facing bounds stay in one place.

/// Where the registry blob lives inside the document string table.
pub mod store {
    /// Section of the document string table that holds the registry.
    pub const SECTION: &str = "DynamicBlocks";
    /// Key of the registry blob inside [`SECTION`].
    pub const KEY: &str = "Registry";
}

/// Geometry definition naming.
pub mod definitions {
    /// Prefix of every canonical definition name.
    pub const NAME_PREFIX: &str = "DB";
    /// Separator between the prefix, the family name and each `name=value` pair.
    pub const SEPARATOR: &str = "_";
    /// Description attached to every generated definition.
    pub const DESCRIPTION: &str = "Dynamic block variant";
}

/// Parameter value bounds.
pub mod parameters {
    /// Smallest value accepted for any parameter.
    pub const MIN_VALUE: f64 = 0.001;
    /// Number of decimal places entered values are rounded to.
    pub const PRECISION_DIGITS: i32 = 6;

    /// Round a value to [`PRECISION_DIGITS`] decimal places.
    pub fn round_value(value: f64) -> f64 {
        let factor = 10f64.powi(PRECISION_DIGITS);
        (value * factor).round() / factor
    }
}

/// Family types shipped with the core.
pub mod family_types {
    pub const RECTANGLE: &str = "rectangle";
}

/// Environment variable names.
pub mod env_vars {
    pub const STORE_PATH: &str = "DYNABLOCK_STORE";
    pub const LOG_JSON: &str = "DYNABLOCK_LOG_JSON";
}

/// Title used for every user-facing message box.
pub const MESSAGE_TITLE: &str = "Dynamic Blocks";
