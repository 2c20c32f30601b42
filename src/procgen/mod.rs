// pure, seed-driven generators; no ECS access in here

pub mod facade;
pub mod instance;
pub mod layout;
pub mod pixels;
pub mod rng;
pub mod subset;

pub use facade::{FacadeStyle, FacadeTextures, RendererSink, WindowGridSpec, clear_roof, synthesize};
pub use instance::{Anchor, InstanceId, InstanceKind, PlacedInstance, SceneSink};
pub use layout::{BlockGridSpec, CityLayout, LayoutTemplates, VehicleSpec, generate};
pub use pixels::PixelBuffer;
pub use rng::SeedStream;
pub use subset::{DamageSelection, select, select_seeded};
