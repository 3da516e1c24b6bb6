//! Minimal geometry primitives exchanged with the host document.

use serde::{Deserialize, Serialize};

/// A point in world or definition space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3d {
    pub const ORIGIN: Point3d = Point3d {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Row-major 4x4 affine transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub m: [[f64; 4]; 4],
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            m: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn translation(x: f64, y: f64, z: f64) -> Self {
        let mut t = Self::identity();
        t.m[0][3] = x;
        t.m[1][3] = y;
        t.m[2][3] = z;
        t
    }

    /// `self * other`: applies `other` first.
    pub fn then(&self, other: &Transform) -> Transform {
        let mut out = [[0.0; 4]; 4];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.m[i][k] * other.m[k][j]).sum();
            }
        }
        Transform { m: out }
    }

    pub fn apply(&self, p: Point3d) -> Point3d {
        let m = &self.m;
        Point3d {
            x: m[0][0] * p.x + m[0][1] * p.y + m[0][2] * p.z + m[0][3],
            y: m[1][0] * p.x + m[1][1] * p.y + m[1][2] * p.z + m[1][3],
            z: m[2][0] * p.x + m[2][1] * p.y + m[2][2] * p.z + m[2][3],
        }
    }
}

/// A shape primitive produced by a geometry factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    /// Polyline through `points`; closed when the last point equals the first.
    Polyline { points: Vec<Point3d> },
}

impl Shape {
    pub fn points(&self) -> &[Point3d] {
        match self {
            Shape::Polyline { points } => points,
        }
    }

    pub fn is_closed(&self) -> bool {
        let points = self.points();
        points.len() > 2 && points.first() == points.last()
    }

    pub fn transformed(&self, xform: &Transform) -> Shape {
        match self {
            Shape::Polyline { points } => Shape::Polyline {
                points: points.iter().map(|p| xform.apply(*p)).collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_moves_point() {
        let t = Transform::translation(1.0, 2.0, 3.0);
        assert_eq!(t.apply(Point3d::ORIGIN), Point3d::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_then_composes_translations() {
        let to_origin = Transform::translation(-2.0, -3.0, 0.0);
        let placed = Transform::translation(10.0, 5.0, 1.0);
        let p = placed.then(&to_origin).apply(Point3d::new(2.5, 3.5, 0.0));
        assert_eq!(p, Point3d::new(10.5, 5.5, 1.0));
    }

    #[test]
    fn test_closed_polyline() {
        let square = Shape::Polyline {
            points: vec![
                Point3d::ORIGIN,
                Point3d::new(1.0, 0.0, 0.0),
                Point3d::new(1.0, 1.0, 0.0),
                Point3d::ORIGIN,
            ],
        };
        assert!(square.is_closed());
    }
}
