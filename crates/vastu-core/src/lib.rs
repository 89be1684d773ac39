pub mod analyze;
pub mod error;
pub mod rules;
pub mod settings;
pub mod state;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub use analyze::analyze;
pub use error::{Error, Result};
pub use rules::RuleCatalog;
pub use settings::{ai_configured, read_settings, write_settings, BackendKind, Settings};
pub use state::{
    apply, mark_saved, set_compliance, Action, DesignState, DirectEdit, FurniturePatch, HistoryEntry,
    ProjectPatch, RoomPatch, Transition, HISTORY_LIMIT,
};

// --- Types ---

/// The nine compass zones used for every rule lookup.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
    schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
    #[serde(alias = "north-east", alias = "north_east")]
    Northeast,
    #[serde(alias = "north-west", alias = "north_west")]
    Northwest,
    #[serde(alias = "south-east", alias = "south_east")]
    Southeast,
    #[serde(alias = "south-west", alias = "south_west")]
    Southwest,
    #[serde(alias = "centre")]
    Center,
}

impl Direction {
    pub const ALL: [Direction; 9] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::Northeast,
        Direction::Northwest,
        Direction::Southeast,
        Direction::Southwest,
        Direction::Center,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
            Direction::Northeast => "northeast",
            Direction::Northwest => "northwest",
            Direction::Southeast => "southeast",
            Direction::Southwest => "southwest",
            Direction::Center => "center",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
    schemars::JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Bedroom,
    Kitchen,
    LivingRoom,
    Bathroom,
    DiningRoom,
    StudyRoom,
    PoojaRoom,
    /// Any type the catalog has no entry for.
    #[serde(other)]
    Other,
}

impl RoomType {
    pub fn as_str(self) -> &'static str {
        match self {
            RoomType::Bedroom => "bedroom",
            RoomType::Kitchen => "kitchen",
            RoomType::LivingRoom => "living_room",
            RoomType::Bathroom => "bathroom",
            RoomType::DiningRoom => "dining_room",
            RoomType::StudyRoom => "study_room",
            RoomType::PoojaRoom => "pooja_room",
            RoomType::Other => "other",
        }
    }

    /// Human-readable label ("living room").
    pub fn label(self) -> String {
        self.as_str().replace('_', " ")
    }

    /// Label with a leading capital ("Living room").
    pub fn title(self) -> String {
        rules::capitalize(&self.label())
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
    schemars::JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum FurnitureType {
    Bed,
    #[serde(alias = "couch")]
    Sofa,
    Table,
    Chair,
    #[serde(alias = "closet")]
    Wardrobe,
    DiningTable,
    StudyTable,
    #[serde(other)]
    Other,
}

impl FurnitureType {
    pub fn as_str(self) -> &'static str {
        match self {
            FurnitureType::Bed => "bed",
            FurnitureType::Sofa => "sofa",
            FurnitureType::Table => "table",
            FurnitureType::Chair => "chair",
            FurnitureType::Wardrobe => "wardrobe",
            FurnitureType::DiningTable => "dining_table",
            FurnitureType::StudyTable => "study_table",
            FurnitureType::Other => "other",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Interior,
    Exterior,
    Landscape,
}

/// Plan position: `x`/`z` are floor-plan coordinates, `direction` the zone used for rules.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
pub struct Placement {
    pub x: f64,
    pub z: f64,
    pub direction: Direction,
}

impl Placement {
    /// Non-finite coordinates become 0 so the placement survives JSON.
    pub fn finite(self) -> Self {
        Self {
            x: finite_or_zero(self.x),
            z: finite_or_zero(self.z),
            ..self
        }
    }

    pub fn distance_to(&self, other: &Placement) -> f64 {
        ((self.x - other.x).powi(2) + (self.z - other.z).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            width: 3.0,
            height: 3.0,
            depth: 3.0,
        }
    }
}

impl Dimensions {
    pub fn new(width: f64, height: f64, depth: f64) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    pub fn is_valid(&self) -> bool {
        [self.width, self.height, self.depth]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }

    /// Non-finite axes become 0, which [`Dimensions::or`] then treats as missing.
    pub fn finite(self) -> Self {
        Self {
            width: finite_or_zero(self.width),
            height: finite_or_zero(self.height),
            depth: finite_or_zero(self.depth),
        }
    }

    /// Replace every non-positive or non-finite axis with the matching axis of `fallback`.
    pub fn or(self, fallback: Dimensions) -> Dimensions {
        let pick = |v: f64, d: f64| if v.is_finite() && v > 0.0 { v } else { d };
        Dimensions {
            width: pick(self.width, fallback.width),
            height: pick(self.height, fallback.height),
            depth: pick(self.depth, fallback.depth),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default, schemars::JsonSchema)]
pub struct Vec3 {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Vec3 {
    pub fn finite(self) -> Self {
        Self {
            x: finite_or_zero(self.x),
            y: finite_or_zero(self.y),
            z: finite_or_zero(self.z),
        }
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub position: Placement,
    pub dimensions: Dimensions,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub vastu_compliant: bool,
    #[serde(default)]
    pub vastu_reason: String,
}

/// A room before the state machine has given it an id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub position: Placement,
    #[serde(default)]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub vastu_compliant: bool,
    #[serde(default)]
    pub vastu_reason: String,
}

impl RoomDraft {
    pub fn into_room(self, id: String) -> Room {
        Room {
            id,
            name: self.name,
            room_type: self.room_type,
            position: self.position.finite(),
            dimensions: self.dimensions.or(Dimensions::default()),
            color: self.color,
            vastu_compliant: self.vastu_compliant,
            vastu_reason: self.vastu_reason,
        }
    }
}

/// Sentinel `roomId` for furniture not yet placed in any room.
pub const UNASSIGNED: &str = "unassigned";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FurnitureItem {
    pub id: String,
    #[serde(rename = "type")]
    pub furniture_type: FurnitureType,
    pub room_id: String,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default)]
    pub vastu_compliant: bool,
    #[serde(default)]
    pub vastu_reason: String,
}

impl FurnitureItem {
    pub fn is_assigned(&self) -> bool {
        self.room_id != UNASSIGNED
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FurnitureDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub furniture_type: FurnitureType,
    #[serde(default = "unassigned")]
    pub room_id: String,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default)]
    pub vastu_compliant: bool,
    #[serde(default)]
    pub vastu_reason: String,
}

impl FurnitureDraft {
    pub fn into_item(self, id: String) -> FurnitureItem {
        FurnitureItem {
            id,
            furniture_type: self.furniture_type,
            room_id: self.room_id,
            position: self.position.finite(),
            rotation: self.rotation.finite(),
            vastu_compliant: self.vastu_compliant,
            vastu_reason: self.vastu_reason,
        }
    }
}

fn unassigned() -> String {
    UNASSIGNED.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entrance {
    pub id: String,
    pub name: String,
    pub position: Placement,
    pub dimensions: Dimensions,
    #[serde(default)]
    pub vastu_compliant: bool,
    #[serde(default)]
    pub vastu_reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntranceDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default = "default_entrance_name")]
    pub name: String,
    pub position: Placement,
    #[serde(default = "default_entrance_dimensions")]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub vastu_compliant: bool,
    #[serde(default)]
    pub vastu_reason: String,
}

impl EntranceDraft {
    pub fn into_entrance(self, id: String) -> Entrance {
        Entrance {
            id,
            name: self.name,
            position: self.position.finite(),
            dimensions: self.dimensions.or(default_entrance_dimensions()),
            vastu_compliant: self.vastu_compliant,
            vastu_reason: self.vastu_reason,
        }
    }
}

fn default_entrance_name() -> String {
    "Main Entrance".to_string()
}

fn default_entrance_dimensions() -> Dimensions {
    Dimensions::new(1.5, 2.5, 0.2)
}

/// Which outdoor layer a site element belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SiteLayer {
    Exterior,
    Landscape,
}

/// Something placed outside the rooms: a gate, a garden, a water feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SiteElement {
    pub id: String,
    pub name: String,
    /// Free-form kind ("gate", "tree", "pond", ...).
    pub kind: String,
    pub position: Placement,
    pub dimensions: Dimensions,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SiteElementDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: String,
    pub position: Placement,
    #[serde(default)]
    pub dimensions: Dimensions,
}

impl SiteElementDraft {
    pub fn into_element(self, id: String) -> SiteElement {
        let name = if self.name.trim().is_empty() {
            self.kind.clone()
        } else {
            self.name
        };
        SiteElement {
            id,
            name,
            kind: self.kind,
            position: self.position.finite(),
            dimensions: self.dimensions.or(Dimensions::default()),
        }
    }
}

// --- Project ---

/// Identity of the project a design belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectInfo {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub project_type: String,
}

impl Default for ProjectInfo {
    fn default() -> Self {
        Self {
            name: "Untitled Project".to_string(),
            description: String::new(),
            project_type: "residential".to_string(),
        }
    }
}

// --- Compliance ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ViolationKind {
    Direction,
    Proximity,
    Orientation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Violation {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Compliance {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Compliance {
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => Compliance::Excellent,
            70..=89 => Compliance::Good,
            50..=69 => Compliance::Fair,
            _ => Compliance::Poor,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceReport {
    pub score: u8,
    pub violations: Vec<Violation>,
    pub suggestions: Vec<String>,
    pub compliance: Compliance,
}

impl Default for ComplianceReport {
    fn default() -> Self {
        Self {
            score: 100,
            violations: vec![],
            suggestions: vec![],
            compliance: Compliance::Excellent,
        }
    }
}

// --- Commands ---

/// The structured mutations the interpreter emits and the state machine consumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    AddRoom(RoomDraft),
    AddFurniture(FurnitureDraft),
    AddEntrance(EntranceDraft),
    MultipleRooms(Vec<RoomDraft>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Command {
    #[serde(flatten)]
    pub kind: CommandKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Command {
    pub fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            explanation: None,
        }
    }

    pub fn explained(kind: CommandKind, explanation: impl Into<String>) -> Self {
        Self {
            kind,
            explanation: Some(explanation.into()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            CommandKind::AddRoom(_) => "ADD_ROOM",
            CommandKind::AddFurniture(_) => "ADD_FURNITURE",
            CommandKind::AddEntrance(_) => "ADD_ENTRANCE",
            CommandKind::MultipleRooms(_) => "MULTIPLE_ROOMS",
        }
    }
}

// --- Storage ---

pub const EXPORT_VERSION: &str = "1.0";

/// The persisted subset of a design.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DesignSnapshot {
    #[serde(default)]
    pub info: ProjectInfo,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub furniture: Vec<FurnitureItem>,
    #[serde(default)]
    pub entrances: Vec<Entrance>,
    #[serde(default)]
    pub exterior_elements: Vec<SiteElement>,
    #[serde(default)]
    pub landscape_elements: Vec<SiteElement>,
    #[serde(default)]
    pub compliance_report: ComplianceReport,
}

/// Versioned envelope for project files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectExport {
    pub version: String,
    pub project: DesignSnapshot,
    pub exported_at: DateTime<Utc>,
}

/// Resolve the global data directory (~/.vastu/).
pub fn vastu_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".vastu")
}

/// Serialize a full design state, history included.
pub fn to_blob(state: &DesignState) -> Result<String> {
    Ok(serde_json::to_string(state)?)
}

pub fn from_blob(blob: &str) -> Result<DesignState> {
    Ok(serde_json::from_str(blob)?)
}

pub fn export_project(state: &DesignState, at: DateTime<Utc>) -> Result<String> {
    let export = ProjectExport {
        version: EXPORT_VERSION.to_string(),
        project: state.snapshot(),
        exported_at: at,
    };
    Ok(serde_json::to_string_pretty(&export)?)
}

/// Parse a project file. Loading yields a clean state: empty history, nothing unsaved.
pub fn import_project(data: &str) -> Result<DesignState> {
    let export: ProjectExport = serde_json::from_str(data)?;
    if export.version != EXPORT_VERSION {
        return Err(Error::UnsupportedVersion(export.version));
    }
    Ok(DesignState::from_snapshot(export.project))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kitchen_draft() -> RoomDraft {
        RoomDraft {
            id: None,
            name: "Kitchen".into(),
            room_type: RoomType::Kitchen,
            position: Placement {
                x: 2.0,
                z: -2.0,
                direction: Direction::Southeast,
            },
            dimensions: Dimensions::default(),
            color: "#f59e0b".into(),
            vastu_compliant: true,
            vastu_reason: String::new(),
        }
    }

    #[test]
    fn command_uses_tagged_wire_shape() {
        let cmd = Command::explained(CommandKind::AddRoom(kitchen_draft()), "because");
        let val = serde_json::to_value(&cmd).unwrap();
        assert_eq!(val["type"], "ADD_ROOM");
        assert_eq!(val["data"]["type"], "kitchen");
        assert_eq!(val["data"]["position"]["direction"], "southeast");
        assert_eq!(val["explanation"], "because");

        let back: Command = serde_json::from_value(val).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn unknown_room_type_degrades_to_other() {
        let room: RoomDraft = serde_json::from_str(
            r#"{"name":"Garage","type":"garage","position":{"x":0,"z":0,"direction":"north"}}"#,
        )
        .unwrap();
        assert_eq!(room.room_type, RoomType::Other);
        assert_eq!(room.dimensions, Dimensions::default());
    }

    #[test]
    fn hyphenated_directions_are_accepted() {
        let d: Direction = serde_json::from_str("\"south-east\"").unwrap();
        assert_eq!(d, Direction::Southeast);
    }

    #[test]
    fn compliance_thresholds() {
        assert_eq!(Compliance::from_score(100), Compliance::Excellent);
        assert_eq!(Compliance::from_score(90), Compliance::Excellent);
        assert_eq!(Compliance::from_score(89), Compliance::Good);
        assert_eq!(Compliance::from_score(70), Compliance::Good);
        assert_eq!(Compliance::from_score(69), Compliance::Fair);
        assert_eq!(Compliance::from_score(50), Compliance::Fair);
        assert_eq!(Compliance::from_score(49), Compliance::Poor);
        assert_eq!(Compliance::from_score(0), Compliance::Poor);
    }

    #[test]
    fn dimensions_fall_back_per_axis() {
        let dims = Dimensions::new(-1.0, f64::NAN, 2.0).or(Dimensions::new(5.0, 3.0, 4.0));
        assert_eq!(dims, Dimensions::new(5.0, 3.0, 2.0));
    }

    #[test]
    fn export_carries_project_identity() {
        let state = apply(
            DesignState::default(),
            Transition::at(
                DirectEdit::UpdateProjectInfo(ProjectPatch {
                    name: Some("Lake House".into()),
                    description: Some("Two floors by the water".into()),
                    project_type: Some("villa".into()),
                }),
                "rename project",
                DateTime::<Utc>::UNIX_EPOCH,
            ),
        );
        let blob = export_project(&state, DateTime::<Utc>::UNIX_EPOCH).unwrap();
        let json: serde_json::Value = serde_json::from_str(&blob).unwrap();
        assert_eq!(json["project"]["info"]["name"], "Lake House");
        assert_eq!(json["project"]["info"]["type"], "villa");

        let loaded = import_project(&blob).unwrap();
        assert_eq!(loaded.info, state.info);
    }

    #[test]
    fn files_without_project_info_get_defaults() {
        let data = r#"{"version":"1.0","project":{"mode":"exterior"},"exportedAt":"2024-01-01T00:00:00Z"}"#;
        let loaded = import_project(data).unwrap();
        assert_eq!(loaded.info, ProjectInfo::default());
        assert_eq!(loaded.info.name, "Untitled Project");
        assert_eq!(loaded.mode, Mode::Exterior);
        assert!(loaded.exterior_elements.is_empty());
    }

    #[test]
    fn import_rejects_unknown_version() {
        let data = r#"{"version":"9.9","project":{},"exportedAt":"2024-01-01T00:00:00Z"}"#;
        assert!(matches!(
            import_project(data),
            Err(Error::UnsupportedVersion(v)) if v == "9.9"
        ));
    }

    #[test]
    fn export_then_import_keeps_entities() {
        let state = apply(
            DesignState::default(),
            Transition::at(
                state::Action::Command(Command::new(CommandKind::AddRoom(kitchen_draft()))),
                "Add a kitchen",
                DateTime::<Utc>::UNIX_EPOCH,
            ),
        );
        let blob = export_project(&state, DateTime::<Utc>::UNIX_EPOCH).unwrap();
        let loaded = import_project(&blob).unwrap();
        assert_eq!(loaded.rooms, state.rooms);
        assert!(loaded.history.is_empty());
        assert!(!loaded.unsaved_changes);
    }
}
