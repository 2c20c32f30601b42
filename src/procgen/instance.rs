// placement records handed to a scene sink
//
// the generator never touches a scene graph; it only describes what should exist.
// parents are referenced by id, so a sink resolves each anchor exactly once

use bevy::math::{Quat, Vec3};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u32);

impl InstanceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreetAxis {
    // runs along z, between block columns
    Vertical,
    // runs along x, between block rows
    Horizontal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SidewalkPiece {
    North,
    South,
    East,
    West,
    CornerNE,
    CornerNW,
    CornerSE,
    CornerSW,
}

impl SidewalkPiece {
    pub const RING: [SidewalkPiece; 8] = [
        SidewalkPiece::North,
        SidewalkPiece::South,
        SidewalkPiece::East,
        SidewalkPiece::West,
        SidewalkPiece::CornerNE,
        SidewalkPiece::CornerNW,
        SidewalkPiece::CornerSE,
        SidewalkPiece::CornerSW,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            SidewalkPiece::North => "N",
            SidewalkPiece::South => "S",
            SidewalkPiece::East => "E",
            SidewalkPiece::West => "W",
            SidewalkPiece::CornerNE => "Corner_NE",
            SidewalkPiece::CornerNW => "Corner_NW",
            SidewalkPiece::CornerSE => "Corner_SE",
            SidewalkPiece::CornerSW => "Corner_SW",
        }
    }

    pub fn is_corner(self) -> bool {
        matches!(
            self,
            SidewalkPiece::CornerNE
                | SidewalkPiece::CornerNW
                | SidewalkPiece::CornerSE
                | SidewalkPiece::CornerSW
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightKind {
    Spot { angle_degrees: f32 },
    Point,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InstanceKind {
    Street {
        axis: StreetAxis,
        index: u32,
    },
    Intersection {
        x: u32,
        z: u32,
    },
    Sidewalk {
        block: (u32, u32),
        piece: SidewalkPiece,
    },
    Vehicle {
        crossing: (u32, u32),
        heading_degrees: f32,
    },
    VehicleLight {
        light: LightKind,
        intensity: f32,
        range: f32,
    },
    Building {
        block: (u32, u32),
        cell: (u32, u32),
        global_index: u32,
        height: f32,
    },
    DamageEffect {
        building_index: u32,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Anchor {
    Instance(InstanceId),
    // a named child of an instance, e.g. the roof of a building template
    Child { instance: InstanceId, name: String },
}

impl Anchor {
    pub fn instance(&self) -> InstanceId {
        match self {
            Anchor::Instance(id) => *id,
            Anchor::Child { instance, .. } => *instance,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedInstance {
    pub id: InstanceId,
    pub name: String,
    pub kind: InstanceKind,
    // local to `parent` when set, world space otherwise
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub parent: Option<Anchor>,
    // template or material name for the sink to resolve
    pub template: Option<String>,
}

impl PlacedInstance {
    pub fn is_building(&self) -> bool {
        matches!(self.kind, InstanceKind::Building { .. })
    }
}

/// Consumer of a finished layout, e.g. a scene graph.
pub trait SceneSink {
    fn place(&mut self, instances: &[PlacedInstance]);
}

// appends instances with sequential ids, so ids double as sequence positions
#[derive(Default)]
pub(crate) struct InstanceList {
    items: Vec<PlacedInstance>,
}

impl InstanceList {
    pub fn push(
        &mut self,
        name: String,
        kind: InstanceKind,
        position: Vec3,
        scale: Vec3,
        template: Option<&str>,
    ) -> InstanceId {
        let id = InstanceId(self.items.len() as u32);
        self.items.push(PlacedInstance {
            id,
            name,
            kind,
            position,
            rotation: Quat::IDENTITY,
            scale,
            parent: None,
            template: template.map(str::to_owned),
        });
        id
    }

    pub fn last_mut(&mut self) -> Option<&mut PlacedInstance> {
        self.items.last_mut()
    }

    pub fn into_vec(self) -> Vec<PlacedInstance> {
        self.items
    }
}
