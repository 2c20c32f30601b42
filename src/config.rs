// Configuration file, all layout measurements in world units (1 unit = 1 building footprint)
// This controls the initial generation parameter settings

pub const INITIAL_SEED: u64 = 1512086461918454205;

// Facade texture (pixels)
pub const TEXTURE_WIDTH: u32 = 512;
pub const TEXTURE_HEIGHT: u32 = 1024;
pub const WINDOW_COLS: u32 = 8;
pub const WINDOW_ROWS: u32 = 20;
pub const WINDOW_ON_PROBABILITY: f32 = 0.33;
pub const WINDOW_PADDING: f32 = 0.08;      // padding fraction inside a cell
pub const EMISSION_INTENSITY: f32 = 2.0;
pub const ROOF_CLEAR_FRACTION: f32 = 0.12; // fraction of texture height kept free of windows

pub const FACADE_COLOR: [f32; 3] = [0.03, 0.05, 0.08];
pub const WINDOW_OFF_COLOR: [f32; 3] = [0.02, 0.02, 0.025];
pub const WINDOW_PALETTE: [[f32; 3]; 3] = [
    [1.0, 0.85, 0.45], // warm
    [0.45, 1.0, 0.6],  // greenish
    [0.6, 0.6, 1.0],   // cool
];

// number of facade textures shared across the city
pub const FACADE_VARIANTS: u32 = 4;

// Block grid
pub const BLOCKS_X: u32 = 15;
pub const BLOCKS_Y: u32 = 15;
pub const BUILDING_WIDTH: f32 = 1.0;
pub const BUILDING_DEPTH: f32 = 1.0;
pub const GAP_BETWEEN_BUILDINGS: f32 = 0.2;
pub const BUILDING_HEIGHT_MIN: f32 = 2.0;
pub const BUILDING_HEIGHT_MAX: f32 = 10.0;

// Streets and sidewalks
pub const STREET_WIDTH: f32 = 3.0;
pub const STREET_THICKNESS: f32 = 0.02;
pub const INTERSECTION_LIFT: f32 = 0.01; // keeps pads above the street planes
pub const SIDEWALK_WIDTH: f32 = 0.6;
pub const SIDEWALK_HEIGHT: f32 = 0.12;   // buildings rest on top of this

// Vehicles
pub const TAXI_SPAWN_PROBABILITY: f32 = 0.25;
pub const MAX_TAXIS: u32 = 30;
pub const TAXI_LIGHT_INTENSITY: f32 = 2.0;
pub const TAXI_LIGHT_RANGE: f32 = 3.0;
pub const TAXI_LIGHT_ANGLE: f32 = 90.0; // degrees
pub const TAXI_LIFT: f32 = 0.02;

// Damage effects
pub const FIRE_PROBABILITY: f32 = 0.2;
pub const MAX_FIRES: u32 = 100;
pub const FIRE_Y_OFFSET: f32 = 0.1; // above the rooftop, avoids z-fighting

// Template names resolved by the scene sink
pub const BUILDING_TEMPLATE: &str = "building";
pub const ROOF_ANCHOR: &str = "Roof";
pub const TAXI_TEMPLATE: &str = "taxi";
pub const FIRE_TEMPLATE: &str = "fire";
pub const STREET_MATERIAL: &str = "street";
pub const INTERSECTION_MATERIAL: &str = "intersection";
pub const SIDEWALK_MATERIAL: &str = "sidewalk";

// lumens per layout light intensity unit
pub const LIGHT_LUMENS_PER_UNIT: f32 = 40_000.0;
