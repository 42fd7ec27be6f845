mod orbit;

pub use orbit::{OrbitRenderer, OrbitScene};
