//! Interactive input boundary.
//!
//! Every method returns `None` when the user cancels.

use dynablock_core::{ObjectId, Point3d};

pub trait Prompt {
    /// Ask for a line of text.
    fn get_string(&mut self, message: &str, default: Option<&str>) -> Option<String>;

    /// Ask for a number no smaller than `minimum`.
    fn get_real(&mut self, message: &str, default: f64, minimum: f64) -> Option<f64>;

    /// Ask for a point.
    fn get_point(&mut self, message: &str) -> Option<Point3d>;

    /// Ask the user to pick one of `items`.
    fn choose(&mut self, items: &[String], message: &str, title: &str) -> Option<String>;

    /// Ask the user to pick a placed block instance in the document.
    fn pick_instance(&mut self, message: &str) -> Option<ObjectId>;

    /// Show a message.
    fn message(&mut self, text: &str, title: &str);
}
