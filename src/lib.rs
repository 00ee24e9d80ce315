// ==============================================================================
// vehicle-physics — ARCADE FOUR-WHEEL VEHICLE CORE
// ------------------------------------------------------------------------------
// Per-frame rigid-body car simulation: raycast suspension, slip-angle tires,
// RWD drivetrain with gearbox, rigid hull vs terrain, semi-implicit
// integration. Rendering, input devices and level geometry live in the host;
// the host hands in a VehicleInput and a TerrainQuery each tick.
//
//   let spec = Arc::new(VehicleSpec::default());
//   let mut car = Vehicle::spawn_on(spec, &terrain, 0.0, 0.0);
//   car.step(&input, &terrain, dt);
// ==============================================================================

pub mod aero;
pub mod body_collision;
pub mod controls;
pub mod drivetrain;
pub mod error;
pub mod integrator;
pub mod math;
pub mod spec;
pub mod state;
pub mod suspension;
pub mod telemetry;
pub mod terrain;
pub mod tire;
pub mod vehicle;

pub use controls::VehicleInput;
pub use error::SpecError;
pub use spec::{CarDescription, SimUnits, TransmissionMode, VehicleSpec};
pub use state::{BodyCollisionPoint, GearboxState, RigidBodyState, WheelId, WheelState};
pub use telemetry::VehicleTelemetry;
pub use terrain::{FlatTerrain, HeightFieldTerrain, SlopeTerrain, Surface, TerrainQuery};
pub use vehicle::Vehicle;
