// Static vehicle configuration: the simulation-unit spec and the real-world
// description it can be derived from.

pub mod description;
pub mod vehicle_spec;

pub use description::{tire_radius_m, CarDescription, SimUnits};
pub use vehicle_spec::*;
