use std::collections::HashMap;
use std::f32::consts::PI;

use bevy::prelude::*;

use crate::config::*;
use crate::procgen::instance::LightKind;
use crate::procgen::{self, Anchor, InstanceKind, PlacedInstance, SceneSink};
use crate::systems::facade::{FacadeMaterials, FacadeParams, apply_variants, synthesize_variants};
use super::*;

// entity hierarchy components
#[derive(Component)]
pub struct City {
    pub seed: u64,
}

#[derive(Component)]
pub struct Building {
    pub global_index: u32,
    pub height: f32,
}

#[derive(Component)]
pub struct Roof;

#[derive(Component)]
pub struct Taxi;

#[derive(Component)]
pub struct Fire {
    pub building_index: u32,
}

// shared meshes and flat materials, looked up by template name
#[derive(Resource)]
pub struct CitySceneAssets {
    pub cube: Handle<Mesh>,
    pub roof: Handle<Mesh>,
    pub taxi: Handle<Mesh>,
    pub fire: Handle<Mesh>,
    pub materials: HashMap<String, Handle<StandardMaterial>>,
}

impl CitySceneAssets {
    fn material(&self, name: Option<&str>) -> Option<Handle<StandardMaterial>> {
        name.and_then(|n| self.materials.get(n)).cloned()
    }
}

pub fn setup_scene_assets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let mut named = HashMap::new();
    let mut flat = |name: &str, color: Color, emissive: LinearRgba| {
        let handle = materials.add(StandardMaterial {
            base_color: color,
            emissive,
            perceptual_roughness: 0.9,
            ..default()
        });
        named.insert(name.to_string(), handle);
    };

    flat(STREET_MATERIAL, Color::srgb(0.05, 0.05, 0.06), LinearRgba::BLACK);
    flat(INTERSECTION_MATERIAL, Color::srgb(0.08, 0.08, 0.09), LinearRgba::BLACK);
    flat(SIDEWALK_MATERIAL, Color::srgb(0.2, 0.2, 0.22), LinearRgba::BLACK);
    flat(TAXI_TEMPLATE, Color::srgb(0.95, 0.75, 0.1), LinearRgba::BLACK);
    flat(FIRE_TEMPLATE, Color::srgb(1.0, 0.35, 0.05), LinearRgba::rgb(8.0, 2.0, 0.3));

    commands.insert_resource(CitySceneAssets {
        cube: meshes.add(Cuboid::new(1.0, 1.0, 1.0)),
        roof: meshes.add(Plane3d::default().mesh().size(1.0, 1.0)),
        taxi: meshes.add(Cuboid::new(0.4, 0.25, 0.8)),
        fire: meshes.add(Sphere::new(0.15)),
        materials: named,
    });
}

// spawns placed instances under a single city root
pub struct CommandsSink<'a, 'w, 's> {
    pub commands: &'a mut Commands<'w, 's>,
    pub assets: &'a CitySceneAssets,
    pub facades: &'a FacadeMaterials,
    pub root: Entity,
    // indexed by instance id
    spawned: Vec<Entity>,
    // named anchor children per building
    anchors: HashMap<(usize, String), Entity>,
}

impl<'a, 'w, 's> CommandsSink<'a, 'w, 's> {
    pub fn new(
        commands: &'a mut Commands<'w, 's>,
        assets: &'a CitySceneAssets,
        facades: &'a FacadeMaterials,
        root: Entity,
    ) -> Self {
        Self {
            commands,
            assets,
            facades,
            root,
            spawned: Vec::new(),
            anchors: HashMap::new(),
        }
    }

    fn resolve(&self, anchor: &Anchor) -> Entity {
        match anchor {
            Anchor::Instance(id) => self.spawned[id.index()],
            Anchor::Child { instance, name } => {
                match self.anchors.get(&(instance.index(), name.clone())) {
                    Some(&entity) => entity,
                    None => {
                        warn!("anchor {} missing on instance {}, using the instance", name, instance.0);
                        self.spawned[instance.index()]
                    }
                }
            }
        }
    }

    fn spawn(&mut self, instance: &PlacedInstance) -> Entity {
        let transform = Transform {
            translation: instance.position,
            rotation: instance.rotation,
            scale: instance.scale,
        };
        let template = instance.template.as_deref();

        let entity = match &instance.kind {
            InstanceKind::Street { .. } | InstanceKind::Intersection { .. } | InstanceKind::Sidewalk { .. } => {
                let mut e = self.commands.spawn((
                    Name::new(instance.name.clone()),
                    Mesh3d(self.assets.cube.clone()),
                    transform,
                ));
                // without a material the surface keeps the default look
                if let Some(material) = self.assets.material(template) {
                    e.insert(MeshMaterial3d(material));
                }
                e.id()
            }
            InstanceKind::Building { global_index, height, .. } => {
                self.spawn_building(instance, *global_index, *height)
            }
            InstanceKind::Vehicle { .. } => {
                let mut e = self.commands.spawn((
                    Name::new(instance.name.clone()),
                    Taxi,
                    Mesh3d(self.assets.taxi.clone()),
                    // the taxi mesh sits on its own base
                    Transform::from_translation(instance.position + Vec3::Y * 0.125)
                        .with_rotation(instance.rotation),
                ));
                if let Some(material) = self.assets.material(template) {
                    e.insert(MeshMaterial3d(material));
                }
                e.id()
            }
            InstanceKind::VehicleLight { light, intensity, range } => {
                let lumens = intensity * LIGHT_LUMENS_PER_UNIT;
                // bevy lights shine along -Z, flip so the layout rotation applies to +Z
                let transform = transform.with_rotation(instance.rotation * Quat::from_rotation_y(PI));
                match light {
                    LightKind::Spot { angle_degrees } => {
                        let outer = (angle_degrees * 0.5).to_radians();
                        self.commands.spawn((
                            Name::new(instance.name.clone()),
                            SpotLight {
                                intensity: lumens,
                                range: *range,
                                outer_angle: outer,
                                inner_angle: outer * 0.6,
                                color: Color::srgb(1.0, 0.85, 0.4),
                                ..default()
                            },
                            transform,
                        )).id()
                    }
                    LightKind::Point => self.commands.spawn((
                        Name::new(instance.name.clone()),
                        PointLight {
                            intensity: lumens,
                            range: *range,
                            color: Color::srgb(1.0, 0.85, 0.4),
                            ..default()
                        },
                        transform,
                    )).id(),
                }
            }
            InstanceKind::DamageEffect { building_index } => {
                let mut e = self.commands.spawn((
                    Name::new(instance.name.clone()),
                    Fire { building_index: *building_index },
                    Mesh3d(self.assets.fire.clone()),
                    Transform::from_translation(instance.position),
                ));
                if let Some(material) = self.assets.material(template) {
                    e.insert(MeshMaterial3d(material));
                }
                e.id()
            }
        };

        let parent = match &instance.parent {
            Some(anchor) => self.resolve(anchor),
            None => self.root,
        };
        self.commands.entity(parent).add_children(&[entity]);
        entity
    }

    // unscaled root, scaled body and a roof anchor at the top face
    fn spawn_building(&mut self, instance: &PlacedInstance, global_index: u32, height: f32) -> Entity {
        let building = self.commands.spawn((
            Name::new(instance.name.clone()),
            Building { global_index, height },
            Transform::from_translation(instance.position).with_rotation(instance.rotation),
            Visibility::default(),
        )).id();

        // no template, keep the transform so anchors still resolve
        if instance.template.is_none() {
            return building;
        }

        let body = self.commands.spawn((
            Mesh3d(self.assets.cube.clone()),
            MeshMaterial3d(self.facades.for_building(global_index)),
            Transform::from_scale(instance.scale),
        )).id();

        let roof = self.commands.spawn((
            Name::new(ROOF_ANCHOR),
            Roof,
            Mesh3d(self.assets.roof.clone()),
            MeshMaterial3d(self.facades.roof.clone()),
            // lifted a hair above the top face
            Transform::from_xyz(0.0, height * 0.5 + 0.001, 0.0)
                .with_scale(Vec3::new(instance.scale.x, 1.0, instance.scale.z)),
        )).id();

        self.commands.entity(building).add_children(&[body, roof]);
        self.anchors.insert((instance.id.index(), ROOF_ANCHOR.to_string()), roof);
        building
    }
}

impl SceneSink for CommandsSink<'_, '_, '_> {
    fn place(&mut self, instances: &[PlacedInstance]) {
        for instance in instances {
            let entity = self.spawn(instance);
            self.spawned.push(entity);
        }
    }
}

// everything a rebuild writes to besides the entity tree
pub struct FacadeTargets<'a> {
    pub materials: &'a FacadeMaterials,
    pub params: &'a FacadeParams,
    pub images: &'a mut Assets<Image>,
    pub standard: &'a mut Assets<StandardMaterial>,
}

// synthesizes the facades and the layout first, then applies both or neither.
// returns false when either parameter set is rejected
fn rebuild_city(
    commands: &mut Commands,
    assets: &CitySceneAssets,
    facades: FacadeTargets,
    params: &CityParams,
    seed: u64,
    status: &mut CityStatus,
) -> bool {
    let generated = synthesize_variants(facades.params, seed, facades.materials.variants.len())
        .and_then(|textures| Ok((textures, procgen::generate(&params.grid, &params.templates, seed)?)));
    let (textures, layout) = match generated {
        Ok(generated) => generated,
        Err(e) => {
            error!("city not generated: {}", e);
            status.error = Some(e.to_string());
            return false;
        }
    };

    apply_variants(
        facades.materials,
        &textures,
        facades.params.style.facade_color,
        facades.images,
        facades.standard,
    );

    // spawn city entity
    let root = commands.spawn((
        Name::new("City"),
        City { seed },
        Transform::default(),
        Visibility::default(),
    )).id();

    let mut sink = CommandsSink::new(commands, assets, facades.materials, root);
    layout.place_into(&mut sink);

    *status = CityStatus {
        buildings: layout.total_buildings,
        fires: layout.damage.len(),
        vehicles: layout.count(|k| matches!(k, InstanceKind::Vehicle { .. })),
        diagnostics: layout.diagnostics,
        error: None,
    };
    info!("city spawned: {} instances, seed {}", layout.instances.len(), seed);
    true
}

pub fn spawn_initial_city(
    mut commands: Commands,
    assets: Res<CitySceneAssets>,
    facades: Res<FacadeMaterials>,
    facade_params: Res<FacadeParams>,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    params: Res<CityParams>,
    seed: Res<Seed>,
    mut status: ResMut<CityStatus>,
) {
    let targets = FacadeTargets {
        materials: &facades,
        params: &facade_params,
        images: &mut images,
        standard: &mut materials,
    };
    rebuild_city(&mut commands, &assets, targets, &params, seed.0, &mut status);
}

pub fn handle_regeneration(
    mut commands: Commands,
    mut events: EventReader<RegenerateEvent>,
    assets: Res<CitySceneAssets>,
    facades: Res<FacadeMaterials>,
    facade_params: Res<FacadeParams>,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    params: Res<CityParams>,
    mut seed: ResMut<Seed>,
    mut status: ResMut<CityStatus>,
    query: Query<Entity, With<City>>,
) {
    let Some(event) = events.read().last() else {
        return;
    };

    // the old city and its facades stay when either parameter set is rejected
    let previous: Vec<Entity> = query.iter().collect();
    let targets = FacadeTargets {
        materials: &facades,
        params: &facade_params,
        images: &mut images,
        standard: &mut materials,
    };
    if rebuild_city(&mut commands, &assets, targets, &params, event.seed, &mut status) {
        seed.0 = event.seed;
        // children are also handled automatically
        for entity in previous {
            commands.entity(entity).try_despawn();
        }
    }
}

pub fn handle_clear(
    mut commands: Commands,
    mut events: EventReader<ClearEvent>,
    mut status: ResMut<CityStatus>,
    query: Query<Entity, With<City>>,
) {
    for _event in events.read() {
        for entity in query.iter() {
            commands.entity(entity).try_despawn();
        }
        *status = CityStatus::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::facade::setup_facades;

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<Image>>()
            .init_resource::<Assets<StandardMaterial>>()
            .insert_resource(FacadeParams {
                grid: procgen::WindowGridSpec {
                    texture_width: 16,
                    texture_height: 32,
                    cols: 2,
                    rows: 4,
                    ..default()
                },
                ..default()
            })
            .insert_resource(Seed(7))
            .insert_resource(CityStatus::default())
            .add_event::<RegenerateEvent>()
            .add_event::<ClearEvent>()
            .add_systems(Startup, (setup_facades, setup_scene_assets, spawn_initial_city).chain())
            .add_systems(Update, (handle_regeneration, handle_clear));
        app
    }

    fn small_city() -> CityParams {
        CityParams {
            grid: BlockGridSpec {
                blocks_x: 2,
                blocks_y: 2,
                ..default()
            },
            templates: LayoutTemplates::standard(),
        }
    }

    fn facade_textures(app: &App) -> Vec<Option<Handle<Image>>> {
        let facades = app.world().resource::<FacadeMaterials>();
        let materials = app.world().resource::<Assets<StandardMaterial>>();
        facades
            .variants
            .iter()
            .map(|h| materials.get(h).and_then(|m| m.base_color_texture.clone()))
            .collect()
    }

    fn count<C: Component>(app: &mut App) -> usize {
        app.world_mut().query::<&C>().iter(app.world()).count()
    }

    #[test]
    fn spawns_buildings_and_fires() {
        let mut app = app();
        app.insert_resource(small_city());
        app.update();

        assert_eq!(count::<City>(&mut app), 1);
        assert_eq!(count::<Building>(&mut app), 36);
        assert_eq!(count::<Roof>(&mut app), 36);
        let status = app.world().resource::<CityStatus>();
        let (fires, vehicles) = (status.fires, status.vehicles);
        assert_eq!(count::<Fire>(&mut app), fires);
        assert_eq!(count::<Taxi>(&mut app), vehicles);
    }

    #[test]
    fn fires_sit_on_roofs() {
        let mut app = app();
        app.insert_resource(small_city());
        app.update();

        let world = app.world_mut();
        let roofs: Vec<Entity> = world.query_filtered::<Entity, With<Roof>>().iter(world).collect();
        let parents: Vec<Entity> = world
            .query_filtered::<&ChildOf, With<Fire>>()
            .iter(world)
            .map(|c| c.parent())
            .collect();
        assert!(!parents.is_empty());
        assert!(parents.iter().all(|p| roofs.contains(p)));
    }

    #[test]
    fn regeneration_replaces_city() {
        let mut app = app();
        app.insert_resource(small_city());
        app.update();

        app.world_mut().send_event(RegenerateEvent { seed: 99 });
        app.update();

        assert_eq!(count::<City>(&mut app), 1);
        assert_eq!(count::<Building>(&mut app), 36);
        assert_eq!(app.world().resource::<Seed>().0, 99);
        assert!(app.world().resource::<CityStatus>().error.is_none());
    }

    #[test]
    fn regeneration_repaints_facades() {
        let mut app = app();
        app.insert_resource(small_city());
        app.update();
        let painted = facade_textures(&app);
        assert!(painted.iter().all(Option::is_some));

        app.world_mut().send_event(RegenerateEvent { seed: 99 });
        app.update();

        let repainted = facade_textures(&app);
        assert!(repainted.iter().zip(&painted).all(|(new, old)| new != old));
    }

    #[test]
    fn rejected_parameters_keep_old_city() {
        let mut app = app();
        app.insert_resource(small_city());
        app.update();
        let painted = facade_textures(&app);

        app.world_mut().resource_mut::<CityParams>().grid.blocks_x = 0;
        app.world_mut().send_event(RegenerateEvent { seed: 99 });
        app.update();

        assert_eq!(count::<City>(&mut app), 1);
        assert_eq!(app.world().resource::<Seed>().0, 7);
        assert!(app.world().resource::<CityStatus>().error.is_some());
        // facades keep the old seed's textures too
        assert_eq!(facade_textures(&app), painted);
    }

    #[test]
    fn rejected_facade_parameters_keep_old_city() {
        let mut app = app();
        app.insert_resource(small_city());
        app.update();
        let painted = facade_textures(&app);
        let buildings = count::<Building>(&mut app);

        app.world_mut().resource_mut::<FacadeParams>().grid.padding_normalized = 0.45;
        app.world_mut().send_event(RegenerateEvent { seed: 99 });
        app.update();

        assert_eq!(count::<City>(&mut app), 1);
        assert_eq!(count::<Building>(&mut app), buildings);
        assert_eq!(app.world().resource::<Seed>().0, 7);
        assert_eq!(facade_textures(&app), painted);
        let status = app.world().resource::<CityStatus>();
        assert!(status.error.as_deref().is_some_and(|e| e.contains("padding_normalized")));
    }

    #[test]
    fn clear_removes_everything() {
        let mut app = app();
        app.insert_resource(small_city());
        app.update();

        app.world_mut().send_event(ClearEvent);
        app.update();

        assert_eq!(count::<City>(&mut app), 0);
        assert_eq!(count::<Building>(&mut app), 0);
    }
}
