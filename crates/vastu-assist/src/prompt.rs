use vastu_core::{DesignState, RuleCatalog};

pub const SYSTEM: &str = "You are a Vastu Shastra architect. You turn design requests into a single \
JSON command and nothing else.";

const FORMAT: &str = r#"Respond with one JSON object:
{
  "type": "ADD_ROOM" | "ADD_FURNITURE" | "ADD_ENTRANCE" | "MULTIPLE_ROOMS",
  "data": {
    "name": "room name",
    "type": "bedroom|kitchen|living_room|bathroom|dining_room|study_room|pooja_room",
    "position": {"x": number, "z": number, "direction": "north|south|east|west|northeast|northwest|southeast|southwest|center"},
    "dimensions": {"width": number, "height": number, "depth": number},
    "vastuCompliant": boolean,
    "vastuReason": "why this placement follows Vastu"
  },
  "explanation": "brief explanation of the decision"
}
For MULTIPLE_ROOMS, "data" is an array of room objects. For ADD_FURNITURE, "data" has
"type" (bed|sofa|table|chair|wardrobe), "roomId" and "rotation" {"x","y","z"}."#;

/// Compact text of the current rooms for the prompt.
pub fn summarize_rooms(state: &DesignState) -> String {
    if state.rooms.is_empty() {
        return "No rooms yet".to_string();
    }
    state
        .rooms
        .iter()
        .map(|r| {
            format!(
                "{} ({}) at position {}",
                r.name,
                r.room_type.as_str(),
                r.position.direction
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn build(text: &str, state: &DesignState, catalog: &RuleCatalog) -> String {
    let mut out = String::with_capacity(2048);
    out.push_str("CURRENT DESIGN:\n");
    out.push_str(&format!("Mode: {:?}\n", state.mode).to_lowercase());
    out.push_str("Rooms: ");
    out.push_str(&summarize_rooms(state));
    out.push_str("\n\n");
    out.push_str(&catalog.prompt_rules());
    out.push_str("\nUSER REQUEST: ");
    out.push_str(text.trim());
    out.push_str("\n\n");
    out.push_str(FORMAT);
    out
}
