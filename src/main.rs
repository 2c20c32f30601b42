use bevy::prelude::*;
use bevy::math::bounding::Aabb2d;
use bevy::core_pipeline::bloom::Bloom;
use bevy::window::{WindowPlugin, PrimaryWindow};
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy_egui::EguiPlugin;
use bevy_rts_camera::*;

// import modules here
use neon_city_gen::systems::city::CityGenerationPlugin;
use neon_city_gen::systems::facade::FacadePlugin;
use neon_city_gen::systems::ui::UIPlugin;

fn main() -> bevy::app::AppExit {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Neon City".into(),
                mode: bevy::window::WindowMode::Windowed,
                resolution: bevy::window::WindowResolution::new(1920.0, 1080.0),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(EguiPlugin::default())
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        .add_plugins(RtsCameraPlugin)

        // my custom plugins
        .add_plugins(FacadePlugin)
        .add_plugins(CityGenerationPlugin)
        .add_plugins(UIPlugin)

        .insert_resource(ClearColor(Color::srgb(0.01, 0.01, 0.02))) // night sky
        .insert_resource(AmbientLight {
            color: Color::srgb(0.4, 0.45, 0.7),
            brightness: 60.0,
            ..default()
        })
        .add_systems(Startup, (start, maximize_window))
        .add_systems(Update, handle_exit)
        .run()
}

fn maximize_window(mut windows: Query<&mut Window, With<PrimaryWindow>>) {
    for mut window in windows.iter_mut() {
        window.set_maximized(true);
    }
}

// application entry point here
fn start(
    mut commands: Commands
) {
    // spawn camera
    commands.spawn((
        Camera {
            hdr: true, // emissive windows need headroom
            ..default()
        },
        Bloom::NATURAL,
        RtsCamera {
            bounds: Aabb2d::new(
                Vec2::new(30.0, 30.0),
                Vec2::new(60.0, 60.0),
            ),
            min_angle: 0.5,
            height_max: 120.0,
            ..default()
        },
        RtsCameraControls {
            key_up: KeyCode::KeyW,
            key_down: KeyCode::KeyS,
            key_left: KeyCode::KeyA,
            key_right: KeyCode::KeyD,
            key_rotate_left: KeyCode::F24,  // should figure out how to unassign a key :)
            key_rotate_right: KeyCode::F23,
            pan_speed: 40.0,
            zoom_sensitivity: 0.15,
            edge_pan_width: 0.0,
            ..default()
        },
    ));

    // moonlight
    commands.spawn((
        DirectionalLight {
            illuminance: 80.,
            color: Color::srgb(0.6, 0.7, 1.0),
            ..default()
        },
        Transform::from_xyz(50000.0, 50000.0, 50000.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

// application exit
fn handle_exit(
    keys: Res<ButtonInput<KeyCode>>,
    mut exit: EventWriter<AppExit>,
) {
    if keys.just_pressed(KeyCode::Escape) {
        exit.write(AppExit::Success);
    }
}
