//! Solid builders on top of truck's sweep API, for feeding `TruckKernel`.
//!
//! truck has no built-in box; a box is three successive sweeps.

use truck_modeling::builder;
use truck_modeling::topology::Solid;
use truck_modeling::{Point3, Vector3};

/// Box spanning `origin` to `origin + size`, via successive translational sweeps.
pub fn make_box(origin: [f64; 3], size: [f64; 3]) -> Solid {
    let v = builder::vertex(Point3::new(origin[0], origin[1], origin[2]));
    let edge = builder::tsweep(&v, Vector3::new(size[0], 0.0, 0.0));
    let face = builder::tsweep(&edge, Vector3::new(0.0, size[1], 0.0));
    builder::tsweep(&face, Vector3::new(0.0, 0.0, size[2]))
}
