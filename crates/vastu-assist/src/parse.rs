use serde_json::Value;
use tracing::debug;
use vastu_core::{
    Command, CommandKind, DesignState, Direction, EntranceDraft, FurnitureDraft, Placement,
    RoomDraft, RoomType, RuleCatalog,
};

use crate::heuristic;
use crate::keywords::{self, Intent};
use crate::RemoteParse;

/// Turn raw backend output into a command. Never fails: structured JSON
/// first, then keywords in the text, then a default bedroom.
pub fn parse_response(
    raw: &str,
    state: &DesignState,
    catalog: &RuleCatalog,
) -> (Command, RemoteParse) {
    if let Some(command) = extract_json_object(raw)
        .and_then(decode)
        .and_then(|c| normalize(c, catalog))
    {
        return (command, RemoteParse::Structured);
    }

    let lower = raw.to_lowercase();
    let intent = keywords::classify(&lower);
    if intent != Intent::Generic {
        debug!(?intent, "no usable JSON in response, classified text instead");
        return (
            heuristic::command_for(intent, &lower, state, catalog),
            RemoteParse::Keywords,
        );
    }

    debug!("response unusable, adding default room");
    (default_command(raw, catalog), RemoteParse::Default)
}

/// The outermost `{...}` span of the text.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

fn decode(json: &str) -> Option<Command> {
    let mut value: Value = serde_json::from_str(json).ok()?;
    let kind = value.get("type")?.as_str()?.to_ascii_uppercase();
    value["type"] = Value::String(kind.clone());

    // Rooms may arrive wrapped as {"type": "ADD_ROOM", "data": {...}}.
    if kind == "MULTIPLE_ROOMS" {
        if let Some(items) = value.get_mut("data").and_then(Value::as_array_mut) {
            for item in items.iter_mut() {
                if let Some(inner) = item.get("data").filter(|d| d.is_object()).cloned() {
                    *item = inner;
                }
            }
        }
    }

    match serde_json::from_value(value) {
        Ok(command) => Some(command),
        Err(e) => {
            debug!(error = %e, "response JSON is not a command");
            None
        }
    }
}

/// Fill what the backend left out from the catalog and recompute derived flags.
/// Ids are dropped so the state machine assigns its own.
fn normalize(command: Command, catalog: &RuleCatalog) -> Option<Command> {
    let kind = match command.kind {
        CommandKind::AddRoom(room) => CommandKind::AddRoom(normalize_room(room, catalog)),
        CommandKind::MultipleRooms(rooms) => {
            if rooms.is_empty() {
                return None;
            }
            CommandKind::MultipleRooms(
                rooms
                    .into_iter()
                    .map(|r| normalize_room(r, catalog))
                    .collect(),
            )
        }
        CommandKind::AddFurniture(item) => {
            let rule = catalog.furniture(item.furniture_type);
            CommandKind::AddFurniture(FurnitureDraft {
                id: None,
                vastu_reason: or_else(item.vastu_reason, || rule.rationale.clone()),
                ..item
            })
        }
        CommandKind::AddEntrance(entrance) => {
            let rule = catalog.entrance();
            CommandKind::AddEntrance(EntranceDraft {
                id: None,
                name: or_else(entrance.name, || "Main Entrance".to_string()),
                dimensions: entrance.dimensions.or(rule.dimensions),
                vastu_compliant: rule
                    .preferred_directions
                    .contains(&entrance.position.direction),
                ..entrance
            })
        }
    };
    Some(Command {
        kind,
        explanation: command.explanation,
    })
}

fn normalize_room(room: RoomDraft, catalog: &RuleCatalog) -> RoomDraft {
    let rule = catalog.room(room.room_type);
    let direction = room.position.direction;
    RoomDraft {
        id: None,
        name: or_else(room.name, || room.room_type.title()),
        color: or_else(room.color, || rule.display_color.clone()),
        dimensions: room.dimensions.or(rule.dimensions),
        vastu_compliant: catalog.is_preferred(room.room_type, direction),
        vastu_reason: or_else(room.vastu_reason, || {
            catalog.room_reason(room.room_type, direction)
        }),
        ..room
    }
}

fn or_else(value: String, fallback: impl FnOnce() -> String) -> String {
    if value.trim().is_empty() {
        fallback()
    } else {
        value
    }
}

fn default_command(raw: &str, catalog: &RuleCatalog) -> Command {
    let rule = catalog.room(RoomType::Bedroom);
    let position = Placement {
        x: 0.0,
        z: 0.0,
        direction: Direction::North,
    };
    let draft = RoomDraft {
        id: None,
        name: "New Room".to_string(),
        room_type: RoomType::Bedroom,
        position,
        dimensions: rule.dimensions,
        color: rule.display_color.clone(),
        vastu_compliant: catalog.is_preferred(RoomType::Bedroom, position.direction),
        vastu_reason: "Default room placement".to_string(),
    };
    let excerpt: String = raw.chars().take(100).collect();
    Command::explained(
        CommandKind::AddRoom(draft),
        format!("Generated room based on request: {excerpt}..."),
    )
}
