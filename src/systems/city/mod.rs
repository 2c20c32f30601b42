// this is the entry point for the city generation plugin
use bevy::prelude::*;

use crate::config::*;
use crate::error::Diagnostic;
use crate::procgen::{BlockGridSpec, LayoutTemplates};

pub mod scene;

// resources
#[derive(Resource)]
pub struct Seed(pub u64);

// layout parameters and the template names the scene resolves
#[derive(Resource, Clone)]
pub struct CityParams {
    pub grid: BlockGridSpec,
    pub templates: LayoutTemplates,
}

impl Default for CityParams {
    fn default() -> Self {
        Self {
            grid: BlockGridSpec::default(),
            templates: LayoutTemplates::standard(),
        }
    }
}

// summary of the last generated city, shown in the ui
#[derive(Resource, Default)]
pub struct CityStatus {
    pub buildings: usize,
    pub fires: usize,
    pub vehicles: usize,
    pub diagnostics: Vec<Diagnostic>,
    pub error: Option<String>,
}

// Event for regeneration
#[derive(Event)]
pub struct RegenerateEvent {
    pub seed: u64,
}

// Event for clearing the city
#[derive(Event)]
pub struct ClearEvent;

// main plugin for generation
pub struct CityGenerationPlugin;

impl Plugin for CityGenerationPlugin {
    fn build(&self, app: &mut App) {
        app
            .insert_resource(Seed(INITIAL_SEED))
            .insert_resource(CityParams::default())
            .insert_resource(CityStatus::default())
            .add_event::<RegenerateEvent>()
            .add_event::<ClearEvent>()

            // facades must exist before buildings reference them
            .add_systems(Startup, (scene::setup_scene_assets, scene::spawn_initial_city)
                .chain()
                .after(crate::systems::facade::setup_facades))
            .add_systems(Update, (scene::handle_regeneration, scene::handle_clear));
    }
}
