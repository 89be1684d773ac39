//! Scores a design against the rule catalog.

use std::f64::consts::PI;

use crate::rules::join_directions;
use crate::{
    Compliance, ComplianceReport, DesignState, Direction, FurnitureItem, FurnitureType, Room,
    RoomType, RuleCatalog, Severity, Violation, ViolationKind,
};

const DIRECTION_PENALTY: i32 = 10;
const PROXIMITY_PENALTY: i32 = 5;
const ORIENTATION_PENALTY: i32 = 8;

/// Plan distance below which a kitchen is considered too close to a living room.
pub const PROXIMITY_THRESHOLD: f64 = 2.0;

/// Band around "facing south" that still counts as south, in degrees.
pub const ORIENTATION_TOLERANCE_DEG: f64 = 5.0;

/// Produce a fresh report for `state`. Total and deterministic.
pub fn analyze(state: &DesignState, catalog: &RuleCatalog) -> ComplianceReport {
    let mut pass = Pass::default();

    for room in &state.rooms {
        check_room_direction(&mut pass, room, catalog);
        match room.room_type {
            RoomType::Kitchen => check_kitchen_proximity(&mut pass, room, state),
            RoomType::LivingRoom => {
                if room.position.direction != Direction::Northeast {
                    pass.suggest("Consider placing living room in northeast for positive energy flow");
                }
            }
            _ => {}
        }
    }

    let entrance_rule = catalog.entrance();
    for entrance in &state.entrances {
        if entrance_rule.preferred_directions.is_empty()
            || entrance_rule
                .preferred_directions
                .contains(&entrance.position.direction)
        {
            continue;
        }
        pass.violate(
            ViolationKind::Direction,
            Severity::Medium,
            format!(
                "{} should be placed in {} direction",
                entrance.name,
                join_directions(&entrance_rule.preferred_directions, " or ")
            ),
            DIRECTION_PENALTY,
        );
        pass.suggest(format!(
            "Move {} to {} to welcome positive energy",
            entrance.name,
            catalog.entrance_direction()
        ));
    }

    for item in &state.furniture {
        // Unassigned or orphaned furniture is still being placed.
        let Some(room) = state.room(&item.room_id) else {
            continue;
        };
        check_furniture(&mut pass, item, room, catalog);
    }

    pass.finish()
}

fn check_room_direction(pass: &mut Pass, room: &Room, catalog: &RuleCatalog) {
    let rule = catalog.room(room.room_type);
    let Some(first) = rule.preferred_directions.first() else {
        return;
    };
    if rule.preferred_directions.contains(&room.position.direction) {
        return;
    }
    pass.violate(
        ViolationKind::Direction,
        Severity::Medium,
        format!(
            "{} should be placed in {} direction",
            room.name,
            join_directions(&rule.preferred_directions, " or ")
        ),
        DIRECTION_PENALTY,
    );
    pass.suggest(format!(
        "Move {} to {} for better Vastu compliance",
        room.name, first
    ));
}

fn check_kitchen_proximity(pass: &mut Pass, kitchen: &Room, state: &DesignState) {
    let nearest = state
        .rooms_of(RoomType::LivingRoom)
        .map(|living| kitchen.position.distance_to(&living.position))
        .fold(f64::INFINITY, f64::min);
    if nearest < PROXIMITY_THRESHOLD {
        pass.violate(
            ViolationKind::Proximity,
            Severity::Low,
            "Kitchen should not be too close to living room",
            PROXIMITY_PENALTY,
        );
    }
}

fn check_furniture(pass: &mut Pass, item: &FurnitureItem, room: &Room, catalog: &RuleCatalog) {
    let yaw = item.rotation.y;
    match (item.furniture_type, room.room_type) {
        (FurnitureType::Bed, RoomType::Bedroom) => {
            if faces_south(yaw) {
                pass.violate(
                    ViolationKind::Orientation,
                    Severity::Medium,
                    "Bed should not face south direction",
                    ORIENTATION_PENALTY,
                );
                pass.suggest("Rotate bed to face east or north for better sleep quality");
            }
        }
        (FurnitureType::Sofa, RoomType::LivingRoom) => {
            let facing = catalog.furniture(FurnitureType::Sofa).facing.as_slice();
            if !facing.is_empty() && !facing.contains(&facing_quadrant(yaw)) {
                pass.suggest("Position sofa to face east or north for positive energy");
            }
        }
        _ => {}
    }
}

/// Fold any angle into (−π, π].
pub fn normalize_angle(radians: f64) -> f64 {
    if !radians.is_finite() {
        return 0.0;
    }
    let mut a = radians.rem_euclid(2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    }
    a
}

/// Whether a yaw points south, within [`ORIENTATION_TOLERANCE_DEG`].
pub fn faces_south(yaw: f64) -> bool {
    let off = PI - normalize_angle(yaw).abs();
    off.to_degrees() <= ORIENTATION_TOLERANCE_DEG
}

/// The compass quadrant a yaw points into: north [−45°, 45°), east [45°, 135°),
/// south beyond ±135°, west otherwise.
pub fn facing_quadrant(yaw: f64) -> Direction {
    let deg = normalize_angle(yaw).to_degrees();
    if (-45.0..45.0).contains(&deg) {
        Direction::North
    } else if (45.0..135.0).contains(&deg) {
        Direction::East
    } else if deg >= 135.0 || deg < -135.0 {
        Direction::South
    } else {
        Direction::West
    }
}

struct Pass {
    score: i32,
    violations: Vec<Violation>,
    suggestions: Vec<String>,
}

impl Default for Pass {
    fn default() -> Self {
        Self {
            score: 100,
            violations: Vec::new(),
            suggestions: Vec::new(),
        }
    }
}

impl Pass {
    fn violate(
        &mut self,
        kind: ViolationKind,
        severity: Severity,
        message: impl Into<String>,
        penalty: i32,
    ) {
        self.violations.push(Violation {
            kind,
            severity,
            message: message.into(),
        });
        self.score -= penalty;
    }

    fn suggest(&mut self, text: impl Into<String>) {
        self.suggestions.push(text.into());
    }

    fn finish(self) -> ComplianceReport {
        let score = self.score.clamp(0, 100) as u8;
        ComplianceReport {
            score,
            violations: self.violations,
            suggestions: self.suggestions,
            compliance: Compliance::from_score(score),
        }
    }
}
