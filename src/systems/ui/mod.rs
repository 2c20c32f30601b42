use bevy::prelude::*;
use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin}; // fps
use bevy_egui::{egui, EguiContexts, EguiPlugin, EguiPrimaryContextPass};
use crate::systems::city::{Seed, CityParams, CityStatus, RegenerateEvent, ClearEvent};
use crate::systems::facade::FacadeParams;

pub struct UIPlugin;

impl Plugin for UIPlugin {
    fn build(&self, app: &mut App) {
        assert!(app.is_plugin_added::<EguiPlugin>());
        app
            .add_systems(Update, key_input)
            .add_systems(EguiPrimaryContextPass, (ui_main, fps)); // UI rendering here
    }
}

fn key_input(
    keyboard_input: Res<ButtonInput<KeyCode>>,
    mut regen_events: EventWriter<RegenerateEvent>,
) {
    if keyboard_input.just_pressed(KeyCode::KeyR) {
        regen_events.write(RegenerateEvent { seed: rand::random() });
    }
}

fn ui_main(
    mut contexts: EguiContexts,
    current_seed: Res<Seed>,
    mut params: ResMut<CityParams>,
    mut facade: ResMut<FacadeParams>,
    status: Res<CityStatus>,
    mut regen_events: EventWriter<RegenerateEvent>,
    mut clear_events: EventWriter<ClearEvent>,
) {
    if let Ok(ctx) = contexts.ctx_mut() {
        egui::SidePanel::left("config_panel")
            .default_width(200.0)
            .min_width(250.0)
            .max_width(400.0)
            .resizable(true)
            .show(ctx, |ui| {
                let mut regenerate = false;

                // camera
                ui.label("Camera: ");
                ui.label("WASD - Move");
                ui.label("Scroll - Zoom");
                ui.label("MMB - Rotate");

                ui.separator();

                ui.label("Generation Parameters:");

                // seed
                egui::CollapsingHeader::new("Seed")
                    .default_open(true)
                    .show(ui, |ui| {
                    ui.label(format!("Current: {}", current_seed.0));
                    ui.horizontal(|ui| {
                        if ui.button("Regenerate")
                            .on_hover_text("New random seed (R)")
                            .clicked() {
                            regen_events.write(RegenerateEvent { seed: rand::random() });
                        }
                        let clear_button = egui::Button::new("Clear").fill(egui::Color32::from_rgb(130, 22, 22));
                        if ui.add(clear_button).clicked() {
                            clear_events.write(ClearEvent);
                        }
                    });
                });

                // block grid
                egui::CollapsingHeader::new("City Grid")
                    .default_open(true)
                    .show(ui, |ui| {
                    let grid = &mut params.grid;
                    regenerate |= ui.add(egui::Slider::new(&mut grid.blocks_x, 1..=30)
                        .text("Blocks X"))
                        .changed();
                    regenerate |= ui.add(egui::Slider::new(&mut grid.blocks_y, 1..=30)
                        .text("Blocks Z"))
                        .changed();
                    regenerate |= ui.add(egui::Slider::new(&mut grid.gap_between_buildings, 0.0..=1.0)
                        .text("Building Gap"))
                        .on_hover_text("Spacing between buildings inside a block.")
                        .changed();
                    regenerate |= ui.add(egui::Slider::new(&mut grid.street_width, 0.5..=6.0)
                        .text("Street Width"))
                        .changed();
                    regenerate |= ui.add(egui::Slider::new(&mut grid.sidewalk_width, 0.0..=2.0)
                        .text("Sidewalk Width"))
                        .changed();
                });

                // building heights
                egui::CollapsingHeader::new("Building Heights")
                    .default_open(true)
                    .show(ui, |ui| {
                    const MARGIN: f32 = 0.5;
                    let grid = &mut params.grid;

                    let max_limit = (grid.height_max - MARGIN).max(0.5);
                    regenerate |= ui.add(egui::Slider::new(&mut grid.height_min, 0.5..=max_limit)
                        .text("Min Height"))
                        .changed();

                    let min_limit = (grid.height_min + MARGIN).min(30.0);
                    regenerate |= ui.add(egui::Slider::new(&mut grid.height_max, min_limit..=30.0)
                        .text("Max Height"))
                        .changed();
                });

                // fires and taxis
                egui::CollapsingHeader::new("Fires & Taxis")
                    .default_open(true)
                    .show(ui, |ui| {
                    let grid = &mut params.grid;
                    regenerate |= ui.add(egui::Slider::new(&mut grid.fire_probability, 0.0..=1.0)
                        .text("Fire Probability"))
                        .on_hover_text("Fraction of buildings set on fire.")
                        .changed();
                    regenerate |= ui.add(egui::Slider::new(&mut grid.max_fire_count, 0..=500)
                        .text("Max Fires"))
                        .changed();
                    regenerate |= ui.checkbox(&mut grid.attach_fire_to_roof_anchor, "Fires on Roofs")
                        .changed();
                    regenerate |= ui.add(egui::Slider::new(&mut grid.vehicles.spawn_probability, 0.0..=1.0)
                        .text("Taxi Probability"))
                        .on_hover_text("Chance that an intersection gets a taxi.")
                        .changed();
                    regenerate |= ui.add(egui::Slider::new(&mut grid.vehicles.max_vehicles, 0..=100)
                        .text("Max Taxis"))
                        .changed();
                });

                // facade textures
                egui::CollapsingHeader::new("Facades")
                    .default_open(false)
                    .show(ui, |ui| {
                    regenerate |= ui.add(egui::Slider::new(&mut facade.grid.cols, 1..=32)
                        .text("Window Columns"))
                        .changed();
                    regenerate |= ui.add(egui::Slider::new(&mut facade.grid.rows, 1..=64)
                        .text("Window Rows"))
                        .changed();
                    regenerate |= ui.add(egui::Slider::new(&mut facade.grid.window_on_probability, 0.0..=1.0)
                        .text("Lit Windows"))
                        .changed();
                    regenerate |= ui.add(egui::Slider::new(&mut facade.grid.padding_normalized, 0.0..=0.4)
                        .text("Window Padding"))
                        .changed();
                    regenerate |= ui.add(egui::Slider::new(&mut facade.style.emission_intensity, 0.0..=8.0)
                        .text("Glow"))
                        .changed();
                    regenerate |= ui.add(egui::Slider::new(&mut facade.style.roof_clear_fraction, 0.0..=0.5)
                        .text("Roof Band"))
                        .changed();
                });

                ui.separator();

                // last generation result
                ui.label(format!("Buildings: {}", status.buildings));
                ui.label(format!("Fires: {}", status.fires));
                ui.label(format!("Taxis: {}", status.vehicles));
                if let Some(error) = &status.error {
                    ui.label(egui::RichText::new(error).color(egui::Color32::from_rgb(178, 34, 34)));
                }
                for diagnostic in &status.diagnostics {
                    ui.label(egui::RichText::new(diagnostic.to_string()).color(egui::Color32::from_rgb(200, 160, 40)));
                }

                ui.separator();
                ui.label("ESC - Exit");

                // trigger regeneration on any parameter change
                if regenerate {
                    regen_events.write(RegenerateEvent { seed: current_seed.0 });
                }
            });
    }
}

fn fps(
    mut contexts: EguiContexts,
    diagnostics: Res<DiagnosticsStore>,
) {
    if let Ok(ctx) = contexts.ctx_mut() {
        egui::Area::new(egui::Id::new("fps_counter"))
            .anchor(egui::Align2::RIGHT_TOP, egui::Vec2::new(-10.0, 10.0))
            .show(ctx, |ui| {
                ui.with_layout(egui::Layout::top_down(egui::Align::RIGHT), |ui| {
                    if let Some(fps_diagnostic) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
                        if let Some(fps) = fps_diagnostic.smoothed() {
                            ui.label(egui::RichText::new(format!("{:.0}", fps))
                                .size(26.0)
                                .color(egui::Color32::WHITE));
                        }
                    }
                });
            });
    }
}
