// city layout: streets, intersections, sidewalks, taxis and buildings on a block grid
//
// every block is a fixed 3x3 grid of building cells. block (bx, bz) is centered at
// (bx * pitch.x, bz * pitch.y) where pitch = block size + street width; all layers share that frame.
//
// emission order is fixed: streets, intersections, sidewalks, vehicles, buildings.
// the damage set is drawn first, from the same stream, against the final building count

use bevy::log::{debug, info, warn};
use bevy::math::{Quat, Vec2, Vec3};

use crate::config::*;
use crate::error::{Diagnostic, GenerationError, Result, check_non_negative, check_positive, check_range, check_unit};
use super::instance::{
    Anchor, InstanceId, InstanceKind, InstanceList, LightKind, PlacedInstance, SceneSink, SidewalkPiece,
    StreetAxis,
};
use super::rng::SeedStream;
use super::subset::{self, DamageSelection};

pub const BLOCK_CELLS: u32 = 3;
pub const BUILDINGS_PER_BLOCK: u32 = BLOCK_CELLS * BLOCK_CELLS;

#[derive(Clone, Debug, PartialEq)]
pub struct VehicleSpec {
    pub spawn_probability: f32,
    pub max_vehicles: u32,
    pub light_intensity: f32,
    pub light_range: f32,
    pub light_angle_degrees: f32,
}

impl Default for VehicleSpec {
    fn default() -> Self {
        Self {
            spawn_probability: TAXI_SPAWN_PROBABILITY,
            max_vehicles: MAX_TAXIS,
            light_intensity: TAXI_LIGHT_INTENSITY,
            light_range: TAXI_LIGHT_RANGE,
            light_angle_degrees: TAXI_LIGHT_ANGLE,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BlockGridSpec {
    pub blocks_x: u32,
    pub blocks_y: u32,
    pub building_footprint: Vec2,
    pub gap_between_buildings: f32,
    pub street_width: f32,
    pub sidewalk_width: f32,
    // sidewalk thickness, buildings rest on top of it
    pub sidewalk_height: f32,
    pub sidewalk_offset: Vec3,
    pub height_min: f32,
    pub height_max: f32,
    pub fire_probability: f32,
    pub max_fire_count: u32,
    pub fire_y_offset: f32,
    pub attach_fire_to_roof_anchor: bool,
    pub vehicles: VehicleSpec,
}

impl Default for BlockGridSpec {
    fn default() -> Self {
        Self {
            blocks_x: BLOCKS_X,
            blocks_y: BLOCKS_Y,
            building_footprint: Vec2::new(BUILDING_WIDTH, BUILDING_DEPTH),
            gap_between_buildings: GAP_BETWEEN_BUILDINGS,
            street_width: STREET_WIDTH,
            sidewalk_width: SIDEWALK_WIDTH,
            sidewalk_height: SIDEWALK_HEIGHT,
            sidewalk_offset: Vec3::ZERO,
            height_min: BUILDING_HEIGHT_MIN,
            height_max: BUILDING_HEIGHT_MAX,
            fire_probability: FIRE_PROBABILITY,
            max_fire_count: MAX_FIRES,
            fire_y_offset: FIRE_Y_OFFSET,
            attach_fire_to_roof_anchor: true,
            vehicles: VehicleSpec::default(),
        }
    }
}

impl BlockGridSpec {
    pub fn validate(&self) -> Result<()> {
        check_positive("blocks_x", self.blocks_x)?;
        check_positive("blocks_y", self.blocks_y)?;
        let footprint = self.building_footprint;
        if !footprint.is_finite() || footprint.x <= 0.0 || footprint.y <= 0.0 {
            return Err(GenerationError::invalid(
                "building_footprint",
                format!("{footprint} must be positive on both axes"),
            ));
        }
        check_non_negative("gap_between_buildings", self.gap_between_buildings)?;
        check_non_negative("street_width", self.street_width)?;
        check_non_negative("sidewalk_width", self.sidewalk_width)?;
        check_non_negative("sidewalk_height", self.sidewalk_height)?;
        if !self.sidewalk_offset.is_finite() {
            return Err(GenerationError::invalid("sidewalk_offset", "must be finite"));
        }
        if !self.height_min.is_finite()
            || !self.height_max.is_finite()
            || self.height_min <= 0.0
            || self.height_min > self.height_max
        {
            return Err(GenerationError::invalid(
                "height_range",
                format!("[{}, {}] needs 0 < min <= max", self.height_min, self.height_max),
            ));
        }
        check_unit("fire_probability", self.fire_probability)?;
        if !self.fire_y_offset.is_finite() {
            return Err(GenerationError::invalid("fire_y_offset", "must be finite"));
        }
        check_unit("spawn_probability", self.vehicles.spawn_probability)?;
        check_non_negative("light_intensity", self.vehicles.light_intensity)?;
        check_non_negative("light_range", self.vehicles.light_range)?;
        // full cone angle
        check_range("light_angle_degrees", self.vehicles.light_angle_degrees, 0.0, 180.0)
    }

    pub fn total_buildings(&self) -> usize {
        self.blocks_x as usize * self.blocks_y as usize * BUILDINGS_PER_BLOCK as usize
    }
}

/// Names of the optional external references the layout points at.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutTemplates {
    pub building: Option<String>,
    // child of the building template used to anchor damage effects
    pub roof_anchor: Option<String>,
    pub vehicle: Option<String>,
    pub damage_effect: Option<String>,
    pub street_material: Option<String>,
    pub intersection_material: Option<String>,
    pub sidewalk_material: Option<String>,
}

impl LayoutTemplates {
    pub fn standard() -> Self {
        Self {
            building: Some(BUILDING_TEMPLATE.into()),
            roof_anchor: Some(ROOF_ANCHOR.into()),
            vehicle: Some(TAXI_TEMPLATE.into()),
            damage_effect: Some(FIRE_TEMPLATE.into()),
            street_material: Some(STREET_MATERIAL.into()),
            intersection_material: Some(INTERSECTION_MATERIAL.into()),
            sidewalk_material: Some(SIDEWALK_MATERIAL.into()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CityLayout {
    pub instances: Vec<PlacedInstance>,
    pub damage: DamageSelection,
    pub total_buildings: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl CityLayout {
    pub fn buildings(&self) -> impl Iterator<Item = &PlacedInstance> {
        self.instances.iter().filter(|i| i.is_building())
    }

    pub fn count(&self, pred: impl Fn(&InstanceKind) -> bool) -> usize {
        self.instances.iter().filter(|i| pred(&i.kind)).count()
    }

    pub fn place_into(&self, sink: &mut impl SceneSink) {
        sink.place(&self.instances);
    }
}

/// Number of damaged buildings: round(total * probability), clamped to the cap.
/// The second value is the unclamped request.
pub fn damage_count(total: usize, probability: f32, max: u32) -> (usize, usize) {
    let requested = (total as f64 * probability as f64).round_ties_even() as usize;
    let allowed = total.min(max as usize);
    (requested.min(allowed), requested)
}

pub fn generate(spec: &BlockGridSpec, templates: &LayoutTemplates, seed: u64) -> Result<CityLayout> {
    spec.validate()?;

    let mut stream = SeedStream::new(seed);
    let mut generator = Generator {
        spec,
        templates,
        frame: Frame::new(spec),
        out: InstanceList::default(),
        diagnostics: Vec::new(),
    };

    // preparation: pick the damaged buildings before anything is placed
    let total = spec.total_buildings();
    let (fires, requested) = damage_count(total, spec.fire_probability, spec.max_fire_count);
    if requested > fires {
        generator.report(Diagnostic::CapacityExceeded {
            resource: "fires",
            requested: requested as u32,
            allowed: fires as u32,
        });
    }
    let damage = subset::select(total, fires, &mut stream);
    if !damage.is_empty() {
        info!("selected {} buildings for fire (out of {} possible)", damage.len(), total);
    }

    generator.streets();
    generator.intersections();
    generator.sidewalks();
    generator.vehicles(&mut stream, seed);
    generator.buildings(&mut stream, &damage);

    info!(
        "generated {} buildings ({}x{} blocks)",
        total, spec.blocks_x, spec.blocks_y
    );

    Ok(CityLayout {
        instances: generator.out.into_vec(),
        damage,
        total_buildings: total,
        diagnostics: generator.diagnostics,
    })
}

// derived sizes shared by every layer
#[derive(Clone, Copy, Debug)]
struct Frame {
    cell: Vec2,
    block: Vec2,
    half_block: Vec2,
    pitch: Vec2,
    total: Vec2,
}

impl Frame {
    fn new(spec: &BlockGridSpec) -> Self {
        let gap = spec.gap_between_buildings;
        let cell = spec.building_footprint + Vec2::splat(gap);
        // three cells, minus the gap that would trail the last one
        let block = cell * BLOCK_CELLS as f32 - Vec2::splat(gap);
        let pitch = block + Vec2::splat(spec.street_width);
        let blocks = Vec2::new(spec.blocks_x as f32, spec.blocks_y as f32);
        Self {
            cell,
            block,
            half_block: block * 0.5,
            pitch,
            total: blocks * pitch - Vec2::splat(spec.street_width),
        }
    }

    fn block_center(&self, bx: u32, bz: u32) -> Vec2 {
        Vec2::new(bx as f32 * self.pitch.x, bz as f32 * self.pitch.y)
    }

    // center line of the street after block column/row `i`
    fn street_x(&self, i: u32, street: f32) -> f32 {
        i as f32 * self.pitch.x + self.half_block.x + street * 0.5
    }

    fn street_z(&self, i: u32, street: f32) -> f32 {
        i as f32 * self.pitch.y + self.half_block.y + street * 0.5
    }
}

struct Generator<'a> {
    spec: &'a BlockGridSpec,
    templates: &'a LayoutTemplates,
    frame: Frame,
    out: InstanceList,
    diagnostics: Vec<Diagnostic>,
}

impl Generator<'_> {
    fn report(&mut self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::MissingDependency { .. } => warn!("city layout: {}", diagnostic),
            Diagnostic::CapacityExceeded { .. } => info!("city layout: {}", diagnostic),
        }
        self.diagnostics.push(diagnostic);
    }

    // resolves an optional reference, reporting it once when absent
    fn require<'t>(
        &mut self,
        reference: &'t Option<String>,
        dependency: &'static str,
        feature: &'static str,
    ) -> Option<&'t str> {
        if reference.is_none() {
            self.report(Diagnostic::MissingDependency { dependency, feature });
        }
        reference.as_deref()
    }

    fn streets(&mut self) {
        let spec = self.spec;
        if spec.blocks_x < 2 && spec.blocks_y < 2 {
            return;
        }
        let templates = self.templates;
        let material = self.require(&templates.street_material, "street_material", "street material");
        let f = self.frame;
        let street = spec.street_width;

        for bx in 0..spec.blocks_x - 1 {
            let center = Vec3::new(f.street_x(bx, street), 0.0, f.total.y * 0.5 - f.half_block.y);
            self.out.push(
                format!("Street_V_{bx}"),
                InstanceKind::Street { axis: StreetAxis::Vertical, index: bx },
                center,
                Vec3::new(street, STREET_THICKNESS, f.total.y),
                material,
            );
        }

        for bz in 0..spec.blocks_y - 1 {
            let center = Vec3::new(f.total.x * 0.5 - f.half_block.x, 0.0, f.street_z(bz, street));
            self.out.push(
                format!("Street_H_{bz}"),
                InstanceKind::Street { axis: StreetAxis::Horizontal, index: bz },
                center,
                Vec3::new(f.total.x, STREET_THICKNESS, street),
                material,
            );
        }
    }

    fn intersections(&mut self) {
        let spec = self.spec;
        if spec.blocks_x < 2 || spec.blocks_y < 2 {
            return;
        }
        let templates = self.templates;
        let material = self.require(
            &templates.intersection_material,
            "intersection_material",
            "intersection material",
        );
        let f = self.frame;
        // pads reach the outer corner of the sidewalk rings
        let size = spec.street_width + spec.sidewalk_width;

        for bx in 0..spec.blocks_x - 1 {
            let x = f.street_x(bx, spec.street_width);
            for bz in 0..spec.blocks_y - 1 {
                let z = f.street_z(bz, spec.street_width);
                self.out.push(
                    format!("Intersection_{bx}_{bz}"),
                    InstanceKind::Intersection { x: bx, z: bz },
                    Vec3::new(x, INTERSECTION_LIFT + STREET_THICKNESS * 0.5, z),
                    Vec3::new(size, STREET_THICKNESS, size),
                    material,
                );
            }
        }
    }

    fn sidewalks(&mut self) {
        let spec = self.spec;
        let templates = self.templates;
        let material = self.require(&templates.sidewalk_material, "sidewalk_material", "sidewalk material");
        let f = self.frame;
        let (width, height) = (spec.sidewalk_width, spec.sidewalk_height);
        let edge = f.half_block + Vec2::splat(width * 0.5);

        for bx in 0..spec.blocks_x {
            for bz in 0..spec.blocks_y {
                let center = f.block_center(bx, bz);
                debug!("block {},{} center ({:.3}, {:.3})", bx, bz, center.x, center.y);

                for piece in SidewalkPiece::RING {
                    let (offset, scale) = match piece {
                        SidewalkPiece::North => (Vec2::new(0.0, edge.y), Vec2::new(f.block.x, width)),
                        SidewalkPiece::South => (Vec2::new(0.0, -edge.y), Vec2::new(f.block.x, width)),
                        SidewalkPiece::East => (Vec2::new(edge.x, 0.0), Vec2::new(width, f.block.y)),
                        SidewalkPiece::West => (Vec2::new(-edge.x, 0.0), Vec2::new(width, f.block.y)),
                        SidewalkPiece::CornerNE => (Vec2::new(edge.x, edge.y), Vec2::splat(width)),
                        SidewalkPiece::CornerNW => (Vec2::new(-edge.x, edge.y), Vec2::splat(width)),
                        SidewalkPiece::CornerSE => (Vec2::new(edge.x, -edge.y), Vec2::splat(width)),
                        SidewalkPiece::CornerSW => (Vec2::new(-edge.x, -edge.y), Vec2::splat(width)),
                    };
                    let at = center + offset;
                    self.out.push(
                        format!("Sidewalk_Block_{bx}_{bz}_{}", piece.suffix()),
                        InstanceKind::Sidewalk { block: (bx, bz), piece },
                        Vec3::new(at.x, height * 0.5, at.y) + spec.sidewalk_offset,
                        Vec3::new(scale.x, height, scale.y),
                        material,
                    );
                }
            }
        }
    }

    // taxis restart the stream from the seed; their draws happen even without a template
    // so building heights never depend on which assets are loaded
    fn vehicles(&mut self, stream: &mut SeedStream, seed: u64) {
        let spec = self.spec;
        let vehicles = &spec.vehicles;
        if vehicles.spawn_probability <= 0.0 || vehicles.max_vehicles == 0 {
            return;
        }
        // restarts the stream, so building heights depend on whether taxis are enabled
        *stream = SeedStream::new(seed);

        let crossings = spec.blocks_x.saturating_sub(1) * spec.blocks_y.saturating_sub(1);
        let templates = self.templates;
        let template = if crossings > 0 {
            self.require(&templates.vehicle, "vehicle", "vehicles")
        } else {
            None
        };
        let f = self.frame;

        let mut spawned = 0;
        'crossings: for bx in 0..spec.blocks_x.saturating_sub(1) {
            let x = f.street_x(bx, spec.street_width);
            for bz in 0..spec.blocks_y.saturating_sub(1) {
                if spawned >= vehicles.max_vehicles {
                    break 'crossings;
                }
                if stream.unit() >= vehicles.spawn_probability as f64 {
                    continue;
                }
                let heading_degrees = if stream.unit() < 0.5 { 0.0 } else { 90.0 };
                spawned += 1;

                let Some(template) = template else {
                    continue;
                };
                let z = f.street_z(bz, spec.street_width);
                let taxi = self.out.push(
                    format!("Taxi_{bx}_{bz}"),
                    InstanceKind::Vehicle { crossing: (bx, bz), heading_degrees },
                    Vec3::new(x, spec.sidewalk_height + TAXI_LIFT, z),
                    Vec3::ONE,
                    Some(template),
                );
                if let Some(placed) = self.out.last_mut() {
                    placed.rotation = Quat::from_rotation_y(heading_degrees.to_radians());
                }

                if vehicles.light_intensity > 0.0 {
                    self.vehicle_lights(taxi);
                }
            }
        }
        debug!("spawned {} taxis", spawned);
    }

    fn vehicle_lights(&mut self, taxi: InstanceId) {
        let vehicles = &self.spec.vehicles;

        // roof light, pitched to point up
        self.out.push(
            "TaxiSpotLight".into(),
            InstanceKind::VehicleLight {
                light: LightKind::Spot { angle_degrees: vehicles.light_angle_degrees },
                intensity: vehicles.light_intensity,
                range: vehicles.light_range,
            },
            Vec3::new(0.0, 0.5, 0.0),
            Vec3::ONE,
            None,
        );
        if let Some(spot) = self.out.last_mut() {
            spot.rotation = Quat::from_rotation_x(-90f32.to_radians());
            spot.parent = Some(Anchor::Instance(taxi));
        }

        // softer ambient light from the middle of the car
        self.out.push(
            "TaxiPointLight".into(),
            InstanceKind::VehicleLight {
                light: LightKind::Point,
                intensity: vehicles.light_intensity * 0.5,
                range: vehicles.light_range * 0.5,
            },
            Vec3::new(0.0, 0.2, 0.0),
            Vec3::ONE,
            None,
        );
        if let Some(point) = self.out.last_mut() {
            point.parent = Some(Anchor::Instance(taxi));
        }
    }

    fn buildings(&mut self, stream: &mut SeedStream, damage: &DamageSelection) {
        let spec = self.spec;
        let f = self.frame;
        let footprint = spec.building_footprint;
        let base_y = spec.sidewalk_height;

        let templates = self.templates;
        let template = self.require(&templates.building, "building", "building template");
        let fire = if damage.is_empty() {
            None
        } else {
            self.require(&templates.damage_effect, "damage_effect", "fire effects")
        };
        // anchors only exist on a real building template
        let roof_anchor = match (&templates.roof_anchor, template) {
            (Some(name), Some(_)) if spec.attach_fire_to_roof_anchor => Some(name.as_str()),
            _ => None,
        };

        // block-major, then cell_x, then cell_z: the numbering the damage set was drawn against
        let mut global_index: u32 = 0;
        for bx in 0..spec.blocks_x {
            for bz in 0..spec.blocks_y {
                let origin = f.block_center(bx, bz);

                for cell_x in 0..BLOCK_CELLS {
                    for cell_z in 0..BLOCK_CELLS {
                        let local = -f.half_block
                            + Vec2::new(cell_x as f32, cell_z as f32) * f.cell
                            + footprint * 0.5;
                        let at = origin + local;
                        let height = stream.range_f32(spec.height_min, spec.height_max);

                        let building = self.out.push(
                            format!("B_{bx}_{bz}_c{cell_x}_{cell_z}"),
                            InstanceKind::Building {
                                block: (bx, bz),
                                cell: (cell_x, cell_z),
                                global_index,
                                height,
                            },
                            // base sits on the sidewalk
                            Vec3::new(at.x, base_y + height * 0.5, at.y),
                            Vec3::new(footprint.x, height, footprint.y),
                            template,
                        );

                        let burning = damage.contains(global_index as usize);
                        if let (Some(fire), true) = (fire, burning) {
                            let (parent, local) = match roof_anchor {
                                Some(name) => (
                                    Anchor::Child { instance: building, name: name.to_owned() },
                                    Vec3::new(0.0, spec.fire_y_offset, 0.0),
                                ),
                                None => (
                                    Anchor::Instance(building),
                                    Vec3::new(0.0, height * 0.5 + spec.fire_y_offset, 0.0),
                                ),
                            };
                            self.out.push(
                                format!("Fire_{global_index}"),
                                InstanceKind::DamageEffect { building_index: global_index },
                                local,
                                Vec3::ONE,
                                Some(fire),
                            );
                            if let Some(effect) = self.out.last_mut() {
                                effect.parent = Some(parent);
                            }
                        }

                        global_index += 1;
                    }
                }
            }
        }
    }
}
