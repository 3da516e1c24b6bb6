//! Common families and values.

use dynablock_core::{Family, FamilyType, ParameterValues};

/// Rectangle parameter values.
pub fn rect_values(width: f64, height: f64) -> ParameterValues {
    let mut values = ParameterValues::new();
    values.insert("Width".to_string(), width);
    values.insert("Height".to_string(), height);
    values
}

/// The "Panel" rectangle family with Width=1.0, Height=2.1.
pub fn panel_family() -> Family {
    Family::new("Panel", FamilyType::rectangle(), rect_values(1.0, 2.1))
}
