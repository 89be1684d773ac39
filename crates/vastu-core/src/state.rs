//! Design state and the reducer that is the only way to change it.
//!
//! `apply` is pure: it consumes a state and a transition and returns the next
//! state. Compliance is not recomputed here; callers run the analyzer and
//! store its report with [`set_compliance`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

use crate::{
    Command, CommandKind, ComplianceReport, DesignSnapshot, Dimensions, Entrance, FurnitureItem,
    FurnitureType, Mode, Placement, ProjectInfo, Room, RoomType, SiteElement, SiteElementDraft,
    SiteLayer, Vec3, UNASSIGNED,
};

/// Most recent transitions kept in `history`.
pub const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DesignState {
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
    #[serde(default)]
    pub history: VecDeque<HistoryEntry>,
    #[serde(default)]
    pub unsaved_changes: bool,
}

impl DesignState {
    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn rooms_of(&self, room_type: RoomType) -> impl Iterator<Item = &Room> {
        self.rooms.iter().filter(move |r| r.room_type == room_type)
    }

    pub fn site_elements(&self, layer: SiteLayer) -> &[SiteElement] {
        match layer {
            SiteLayer::Exterior => &self.exterior_elements,
            SiteLayer::Landscape => &self.landscape_elements,
        }
    }

    pub fn snapshot(&self) -> DesignSnapshot {
        DesignSnapshot {
            info: self.info.clone(),
            mode: self.mode,
            rooms: self.rooms.clone(),
            furniture: self.furniture.clone(),
            entrances: self.entrances.clone(),
            exterior_elements: self.exterior_elements.clone(),
            landscape_elements: self.landscape_elements.clone(),
            compliance_report: self.compliance_report.clone(),
        }
    }

    /// A freshly loaded design: nothing unsaved, no history.
    pub fn from_snapshot(snapshot: DesignSnapshot) -> Self {
        Self {
            info: snapshot.info,
            mode: snapshot.mode,
            rooms: snapshot.rooms,
            furniture: snapshot.furniture,
            entrances: snapshot.entrances,
            exterior_elements: snapshot.exterior_elements,
            landscape_elements: snapshot.landscape_elements,
            compliance_report: snapshot.compliance_report,
            history: VecDeque::new(),
            unsaved_changes: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub input: String,
    pub response: Action,
}

/// Partial update for a room; `None` fields are left as they are.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RoomPatch {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub room_type: Option<RoomType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Placement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vastu_compliant: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vastu_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FurniturePatch {
    pub id: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub furniture_type: Option<FurnitureType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vastu_compliant: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vastu_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,
}

/// Edits made directly by the user rather than produced by the interpreter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DirectEdit {
    UpdateRoom(RoomPatch),
    DeleteRoom(String),
    UpdateFurniture(FurniturePatch),
    DeleteFurniture(String),
    DeleteEntrance(String),
    AddSiteElement {
        layer: SiteLayer,
        element: SiteElementDraft,
    },
    DeleteSiteElement(String),
    UpdateProjectInfo(ProjectPatch),
    SetMode(Mode),
    ClearDesign,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "body", rename_all = "camelCase")]
pub enum Action {
    Command(Command),
    Edit(DirectEdit),
}

impl From<Command> for Action {
    fn from(command: Command) -> Self {
        Action::Command(command)
    }
}

impl From<DirectEdit> for Action {
    fn from(edit: DirectEdit) -> Self {
        Action::Edit(edit)
    }
}

/// An action plus what the history should remember about it.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub action: Action,
    pub input: String,
    pub at: DateTime<Utc>,
}

impl Transition {
    /// Stamped with the current time.
    pub fn new(action: impl Into<Action>, input: impl Into<String>) -> Self {
        Self::at(action, input, Utc::now())
    }

    pub fn at(action: impl Into<Action>, input: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            action: action.into(),
            input: input.into(),
            at,
        }
    }
}

/// Apply one transition. Edits naming an id that no longer exists leave the
/// state untouched and are not recorded.
pub fn apply(mut state: DesignState, transition: Transition) -> DesignState {
    let Transition { action, input, at } = transition;
    let action = finite_action(action);

    let changed = match &action {
        Action::Command(command) => {
            apply_command(&mut state, &command.kind);
            true
        }
        Action::Edit(edit) => apply_edit(&mut state, edit),
    };
    if !changed {
        debug!(?action, "ignoring edit for missing entity");
        return state;
    }

    state.history.push_back(HistoryEntry {
        timestamp: at,
        input,
        response: action,
    });
    while state.history.len() > HISTORY_LIMIT {
        state.history.pop_front();
    }
    state
}

/// Replace non-finite coordinates with 0 so the state and its history stay
/// serializable.
fn finite_action(action: Action) -> Action {
    match action {
        Action::Command(mut command) => {
            match &mut command.kind {
                CommandKind::AddRoom(draft) => finite_room(draft),
                CommandKind::MultipleRooms(drafts) => drafts.iter_mut().for_each(finite_room),
                CommandKind::AddFurniture(draft) => {
                    draft.position = draft.position.finite();
                    draft.rotation = draft.rotation.finite();
                }
                CommandKind::AddEntrance(draft) => {
                    draft.position = draft.position.finite();
                    draft.dimensions = draft.dimensions.finite();
                }
            }
            Action::Command(command)
        }
        Action::Edit(mut edit) => {
            match &mut edit {
                DirectEdit::UpdateRoom(patch) => {
                    patch.position = patch.position.map(Placement::finite);
                    patch.dimensions = patch.dimensions.map(Dimensions::finite);
                }
                DirectEdit::UpdateFurniture(patch) => {
                    patch.position = patch.position.map(Vec3::finite);
                    patch.rotation = patch.rotation.map(Vec3::finite);
                }
                DirectEdit::AddSiteElement { element, .. } => {
                    element.position = element.position.finite();
                    element.dimensions = element.dimensions.finite();
                }
                _ => {}
            }
            Action::Edit(edit)
        }
    }
}

fn finite_room(draft: &mut crate::RoomDraft) {
    draft.position = draft.position.finite();
    draft.dimensions = draft.dimensions.finite();
}

/// Store a fresh analyzer report. Not a design change, so not recorded.
pub fn set_compliance(mut state: DesignState, report: ComplianceReport) -> DesignState {
    state.compliance_report = report;
    state
}

pub fn mark_saved(mut state: DesignState) -> DesignState {
    state.unsaved_changes = false;
    state
}

fn apply_command(state: &mut DesignState, kind: &CommandKind) {
    match kind {
        CommandKind::AddRoom(draft) => {
            let mut ids = IdAllocator::new("room", state.rooms.iter().map(|r| r.id.as_str()));
            let id = ids.assign(draft.id.as_deref());
            state.rooms.push(draft.clone().into_room(id));
        }
        CommandKind::MultipleRooms(drafts) => {
            let mut ids = IdAllocator::new("room", state.rooms.iter().map(|r| r.id.as_str()));
            let rooms: Vec<Room> = drafts
                .iter()
                .map(|d| {
                    let id = ids.assign(d.id.as_deref());
                    d.clone().into_room(id)
                })
                .collect();
            state.rooms.extend(rooms);
        }
        CommandKind::AddFurniture(draft) => {
            let mut ids = IdAllocator::new(
                "furniture",
                state.furniture.iter().map(|f| f.id.as_str()),
            );
            let id = ids.assign(draft.id.as_deref());
            let mut item = draft.clone().into_item(id);
            item.room_id = resolve_room_id(state, item.room_id);
            state.furniture.push(item);
        }
        CommandKind::AddEntrance(draft) => {
            let mut ids = IdAllocator::new(
                "entrance",
                state.entrances.iter().map(|e| e.id.as_str()),
            );
            let id = ids.assign(draft.id.as_deref());
            state.entrances.push(draft.clone().into_entrance(id));
        }
    }
    state.unsaved_changes = true;
}

fn apply_edit(state: &mut DesignState, edit: &DirectEdit) -> bool {
    match edit {
        DirectEdit::UpdateRoom(patch) => {
            let Some(room) = state.rooms.iter_mut().find(|r| r.id == patch.id) else {
                return false;
            };
            merge_room(room, patch);
        }
        DirectEdit::DeleteRoom(id) => {
            let before = state.rooms.len();
            state.rooms.retain(|r| &r.id != id);
            if state.rooms.len() == before {
                return false;
            }
            state.furniture.retain(|f| &f.room_id != id);
        }
        DirectEdit::UpdateFurniture(patch) => {
            let room_id = patch
                .room_id
                .clone()
                .map(|id| resolve_room_id(state, id));
            let Some(item) = state.furniture.iter_mut().find(|f| f.id == patch.id) else {
                return false;
            };
            merge_furniture(item, patch, room_id);
        }
        DirectEdit::DeleteFurniture(id) => {
            let before = state.furniture.len();
            state.furniture.retain(|f| &f.id != id);
            if state.furniture.len() == before {
                return false;
            }
        }
        DirectEdit::DeleteEntrance(id) => {
            let before = state.entrances.len();
            state.entrances.retain(|e| &e.id != id);
            if state.entrances.len() == before {
                return false;
            }
        }
        DirectEdit::AddSiteElement { layer, element } => {
            let (prefix, elements) = match layer {
                SiteLayer::Exterior => ("exterior", &mut state.exterior_elements),
                SiteLayer::Landscape => ("landscape", &mut state.landscape_elements),
            };
            let mut ids = IdAllocator::new(prefix, elements.iter().map(|e| e.id.as_str()));
            let id = ids.assign(None);
            elements.push(element.clone().into_element(id));
        }
        DirectEdit::DeleteSiteElement(id) => {
            let before = state.exterior_elements.len() + state.landscape_elements.len();
            state.exterior_elements.retain(|e| &e.id != id);
            state.landscape_elements.retain(|e| &e.id != id);
            if state.exterior_elements.len() + state.landscape_elements.len() == before {
                return false;
            }
        }
        DirectEdit::UpdateProjectInfo(patch) => {
            if let Some(name) = &patch.name {
                state.info.name = name.clone();
            }
            if let Some(description) = &patch.description {
                state.info.description = description.clone();
            }
            if let Some(project_type) = &patch.project_type {
                state.info.project_type = project_type.clone();
            }
        }
        DirectEdit::SetMode(mode) => {
            state.mode = *mode;
        }
        DirectEdit::ClearDesign => {
            state.rooms.clear();
            state.furniture.clear();
            state.entrances.clear();
            state.exterior_elements.clear();
            state.landscape_elements.clear();
            state.compliance_report = ComplianceReport::default();
            state.unsaved_changes = false;
            return true;
        }
    }
    state.unsaved_changes = true;
    true
}

fn merge_room(room: &mut Room, patch: &RoomPatch) {
    if let Some(name) = &patch.name {
        room.name = name.clone();
    }
    if let Some(room_type) = patch.room_type {
        room.room_type = room_type;
    }
    if let Some(position) = patch.position {
        room.position = position;
    }
    if let Some(dimensions) = patch.dimensions {
        room.dimensions = dimensions.or(room.dimensions);
    }
    if let Some(color) = &patch.color {
        room.color = color.clone();
    }
    if let Some(compliant) = patch.vastu_compliant {
        room.vastu_compliant = compliant;
    }
    if let Some(reason) = &patch.vastu_reason {
        room.vastu_reason = reason.clone();
    }
}

fn merge_furniture(item: &mut FurnitureItem, patch: &FurniturePatch, room_id: Option<String>) {
    if let Some(furniture_type) = patch.furniture_type {
        item.furniture_type = furniture_type;
    }
    if let Some(room_id) = room_id {
        item.room_id = room_id;
    }
    if let Some(position) = patch.position {
        item.position = position;
    }
    if let Some(rotation) = patch.rotation {
        item.rotation = rotation;
    }
    if let Some(compliant) = patch.vastu_compliant {
        item.vastu_compliant = compliant;
    }
    if let Some(reason) = &patch.vastu_reason {
        item.vastu_reason = reason.clone();
    }
}

/// Furniture may only point at a live room; anything else becomes the sentinel.
fn resolve_room_id(state: &DesignState, room_id: String) -> String {
    if room_id == UNASSIGNED || state.room(&room_id).is_some() {
        room_id
    } else {
        debug!(room_id = %room_id, "furniture references unknown room, unassigning");
        UNASSIGNED.to_string()
    }
}

/// Hands out `{prefix}-{N}` ids above the highest existing one, honouring a
/// requested id when it is free.
struct IdAllocator {
    prefix: &'static str,
    next: u64,
    taken: HashSet<String>,
}

impl IdAllocator {
    fn new<'a>(prefix: &'static str, existing: impl Iterator<Item = &'a str>) -> Self {
        let taken: HashSet<String> = existing.map(str::to_string).collect();
        let max = taken
            .iter()
            .filter_map(|id| {
                id.strip_prefix(prefix)
                    .and_then(|rest| rest.strip_prefix('-'))
                    .and_then(|n| n.parse::<u64>().ok())
            })
            .max()
            .unwrap_or(0);
        Self {
            prefix,
            next: max + 1,
            taken,
        }
    }

    fn assign(&mut self, requested: Option<&str>) -> String {
        if let Some(id) = requested.filter(|id| !id.is_empty() && !self.taken.contains(*id)) {
            self.taken.insert(id.to_string());
            return id.to_string();
        }
        loop {
            let id = format!("{}-{}", self.prefix, self.next);
            self.next += 1;
            if self.taken.insert(id.clone()) {
                return id;
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn test_room(
    name: &str,
    room_type: RoomType,
    x: f64,
    z: f64,
    direction: crate::Direction,
) -> crate::RoomDraft {
    crate::RoomDraft {
        id: None,
        name: name.to_string(),
        room_type,
        position: Placement { x, z, direction },
        dimensions: Dimensions::default(),
        color: String::new(),
        vastu_compliant: true,
        vastu_reason: String::new(),
    }
}
