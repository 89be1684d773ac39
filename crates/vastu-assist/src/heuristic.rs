//! Deterministic text-to-command mapping. Always available; the remote
//! strategy falls back to it.

use vastu_core::rules::position_for;
use vastu_core::{
    Command, CommandKind, DesignState, Dimensions, Direction, EntranceDraft, FurnitureDraft,
    RoomDraft, RoomType, RuleCatalog, Vec3, UNASSIGNED,
};

use crate::keywords::{self, Intent};

/// Map an utterance to a command. Same input, same output.
pub fn interpret(text: &str, state: &DesignState, catalog: &RuleCatalog) -> Command {
    let lower = text.to_lowercase();
    command_for(keywords::classify(&lower), &lower, state, catalog)
}

pub(crate) fn command_for(
    intent: Intent,
    lower: &str,
    state: &DesignState,
    catalog: &RuleCatalog,
) -> Command {
    match intent {
        Intent::House => house_layout(keywords::bedroom_count(lower), catalog),
        Intent::Room => single_room(keywords::room_subtype(lower), state, catalog),
        Intent::Kitchen => single_room(RoomType::Kitchen, state, catalog),
        Intent::LivingRoom => single_room(RoomType::LivingRoom, state, catalog),
        Intent::Bathroom => single_room(RoomType::Bathroom, state, catalog),
        Intent::Furniture => furniture(lower, state, catalog),
        Intent::Entrance => entrance(catalog),
        Intent::Generic => single_room(RoomType::Bedroom, state, catalog),
    }
}

/// A room of `room_type` in `direction`, dressed from the catalog.
pub(crate) fn room_draft(
    name: String,
    room_type: RoomType,
    direction: Direction,
    catalog: &RuleCatalog,
) -> RoomDraft {
    let rule = catalog.room(room_type);
    RoomDraft {
        id: None,
        name,
        room_type,
        position: position_for(direction),
        dimensions: rule.dimensions,
        color: rule.display_color.clone(),
        vastu_compliant: catalog.is_preferred(room_type, direction),
        vastu_reason: catalog.room_reason(room_type, direction),
    }
}

fn single_room(room_type: RoomType, state: &DesignState, catalog: &RuleCatalog) -> Command {
    let direction = catalog.preferred_direction(room_type);
    let count = state.rooms_of(room_type).count();
    let draft = room_draft(
        format!("{} {}", room_type.title(), count + 1),
        room_type,
        direction,
        catalog,
    );
    Command::explained(
        CommandKind::AddRoom(draft),
        format!(
            "Added {} in {} direction following Vastu principles: {}",
            room_type.label(),
            direction,
            catalog.room(room_type).description
        ),
    )
}

fn house_layout(bedrooms: usize, catalog: &RuleCatalog) -> Command {
    let bedroom_dirs = &catalog.room(RoomType::Bedroom).preferred_directions;
    let master_dir = catalog.preferred_direction(RoomType::Bedroom);

    let mut rooms = Vec::with_capacity(bedrooms + 3);
    let mut master = room_draft(
        "Master bedroom".to_string(),
        RoomType::Bedroom,
        master_dir,
        catalog,
    );
    master.dimensions = Dimensions::new(4.0, 3.0, 4.0);
    rooms.push(master);

    // Extra bedrooms take the secondary bedroom zones in turn.
    let secondary: Vec<Direction> = bedroom_dirs.iter().skip(1).copied().collect();
    for n in 2..=bedrooms {
        let direction = if secondary.is_empty() {
            master_dir
        } else {
            secondary[(n - 2) % secondary.len()]
        };
        rooms.push(room_draft(
            format!("Bedroom {n}"),
            RoomType::Bedroom,
            direction,
            catalog,
        ));
    }

    let mut summary = vec![format!("Master bedroom ({master_dir})")];
    for room_type in [RoomType::Kitchen, RoomType::LivingRoom, RoomType::Bathroom] {
        let direction = catalog.preferred_direction(room_type);
        rooms.push(room_draft(
            room_type.title(),
            room_type,
            direction,
            catalog,
        ));
        summary.push(format!("{} ({direction})", room_type.title()));
    }

    Command::explained(
        CommandKind::MultipleRooms(rooms),
        format!(
            "Generated {bedrooms}-bedroom house layout following Vastu principles: {}",
            summary.join(", ")
        ),
    )
}

fn furniture(lower: &str, state: &DesignState, catalog: &RuleCatalog) -> Command {
    let furniture_type = keywords::furniture_type(lower);
    let room_id = state
        .rooms
        .first()
        .map(|r| r.id.clone())
        .unwrap_or_else(|| UNASSIGNED.to_string());
    let rule = catalog.furniture(furniture_type);
    let draft = FurnitureDraft {
        id: None,
        furniture_type,
        room_id,
        position: Vec3::default(),
        rotation: Vec3::default(),
        vastu_compliant: true,
        vastu_reason: rule.rationale.clone(),
    };
    Command::explained(
        CommandKind::AddFurniture(draft),
        format!(
            "Added {} with Vastu-compliant positioning: {}",
            furniture_type.as_str().replace('_', " "),
            rule.placement
        ),
    )
}

fn entrance(catalog: &RuleCatalog) -> Command {
    let direction = catalog.entrance_direction();
    let rule = catalog.entrance();
    let draft = EntranceDraft {
        id: None,
        name: "Main Entrance".to_string(),
        position: position_for(direction),
        dimensions: rule.dimensions,
        vastu_compliant: true,
        vastu_reason: format!("Main entrance in {direction} for prosperity and positive energy"),
    };
    Command::explained(
        CommandKind::AddEntrance(draft),
        format!("Main entrance positioned in {direction} as per Vastu principles for prosperity"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use vastu_core::{apply, FurnitureType, Transition};

    fn catalog() -> RuleCatalog {
        RuleCatalog::standard()
    }

    fn rooms(cmd: &Command) -> &[RoomDraft] {
        match &cmd.kind {
            CommandKind::MultipleRooms(rooms) => rooms,
            other => panic!("expected MULTIPLE_ROOMS, got {other:?}"),
        }
    }

    #[test]
    fn three_bedroom_house() {
        let cmd = interpret(
            "Create a 3-bedroom house with southeast kitchen",
            &DesignState::default(),
            &catalog(),
        );
        let rooms = rooms(&cmd);
        let of = |t: RoomType| rooms.iter().filter(move |r| r.room_type == t);

        assert_eq!(of(RoomType::Bedroom).count(), 3);
        let master = &rooms[0];
        assert_eq!(master.name, "Master bedroom");
        let names: Vec<_> = rooms.iter().skip(3).map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Kitchen", "Living room", "Bathroom"]);
        assert_eq!(master.position.direction, Direction::Southwest);
        assert_eq!(master.dimensions, Dimensions::new(4.0, 3.0, 4.0));
        let extra: Vec<_> = of(RoomType::Bedroom)
            .skip(1)
            .map(|r| r.position.direction)
            .collect();
        assert_eq!(extra, [Direction::South, Direction::West]);

        let single = |t: RoomType| {
            let found: Vec<_> = of(t).collect();
            assert_eq!(found.len(), 1, "{t:?}");
            found[0].position.direction
        };
        assert_eq!(single(RoomType::Kitchen), Direction::Southeast);
        assert_eq!(single(RoomType::LivingRoom), Direction::Northeast);
        assert_eq!(single(RoomType::Bathroom), Direction::Northwest);
        assert_eq!(rooms.len(), 6);
        assert!(rooms.iter().all(|r| r.vastu_compliant && r.id.is_none()));
        assert!(cmd
            .explanation
            .as_deref()
            .is_some_and(|e| e.starts_with("Generated 3-bedroom house layout")));
    }

    #[test]
    fn house_defaults_to_two_bedrooms() {
        let cmd = interpret("design my home", &DesignState::default(), &catalog());
        let rooms = rooms(&cmd);
        assert_eq!(rooms.len(), 5);
        assert_eq!(rooms[1].name, "Bedroom 2");
    }

    #[test]
    fn add_a_kitchen() {
        let cmd = interpret("Add a kitchen", &DesignState::default(), &catalog());
        let CommandKind::AddRoom(room) = &cmd.kind else {
            panic!("expected ADD_ROOM, got {cmd:?}");
        };
        assert_eq!(room.room_type, RoomType::Kitchen);
        assert_eq!(room.position.direction, Direction::Southeast);
        assert_eq!(room.dimensions, Dimensions::new(3.0, 3.0, 3.0));
        assert_eq!(room.name, "Kitchen 1");
        assert_eq!(room.color, "#f59e0b");
        assert_eq!(
            room.vastu_reason,
            "Kitchen in southeast for fire element and cooking facing east"
        );
        assert!(cmd.explanation.is_some());
    }

    #[test]
    fn names_count_rooms_of_the_same_type() {
        let catalog = catalog();
        let mut state = DesignState::default();
        for _ in 0..2 {
            let cmd = interpret("add a bedroom", &state, &catalog);
            state = apply(
                state,
                Transition::at(cmd, "add a bedroom", DateTime::<Utc>::UNIX_EPOCH),
            );
        }
        let cmd = interpret("Add a study room", &state, &catalog);
        let CommandKind::AddRoom(room) = &cmd.kind else {
            panic!("expected ADD_ROOM");
        };
        assert_eq!(room.name, "Study room 1");
        assert_eq!(room.position.direction, Direction::Northeast);
        assert_eq!(state.rooms[1].name, "Bedroom 2");
    }

    #[test]
    fn furniture_attaches_to_first_room() {
        let catalog = catalog();
        let cmd = interpret("add a sofa, no, a couch", &DesignState::default(), &catalog);
        let CommandKind::AddFurniture(item) = &cmd.kind else {
            panic!("expected ADD_FURNITURE");
        };
        assert_eq!(item.furniture_type, FurnitureType::Sofa);
        assert_eq!(item.room_id, UNASSIGNED);

        let state = apply(
            DesignState::default(),
            Transition::at(
                interpret("add a kitchen", &DesignState::default(), &catalog),
                "add a kitchen",
                DateTime::<Utc>::UNIX_EPOCH,
            ),
        );
        let cmd = interpret("some furniture", &state, &catalog);
        let CommandKind::AddFurniture(item) = &cmd.kind else {
            panic!("expected ADD_FURNITURE");
        };
        assert_eq!(item.furniture_type, FurnitureType::Bed);
        assert_eq!(item.room_id, "room-1");
    }

    #[test]
    fn couch_alone_is_not_a_furniture_request() {
        let cmd = interpret("add a couch", &DesignState::default(), &catalog());
        let CommandKind::AddRoom(room) = &cmd.kind else {
            panic!("expected ADD_ROOM, got {cmd:?}");
        };
        assert_eq!(room.room_type, RoomType::Bedroom);

        let cmd = interpret("furniture: a couch", &DesignState::default(), &catalog());
        let CommandKind::AddFurniture(item) = &cmd.kind else {
            panic!("expected ADD_FURNITURE");
        };
        assert_eq!(item.furniture_type, FurnitureType::Sofa);
    }

    #[test]
    fn single_and_layout_names_share_casing() {
        let catalog = catalog();
        let single = interpret("add a living room", &DesignState::default(), &catalog);
        let CommandKind::AddRoom(room) = &single.kind else {
            panic!("expected ADD_ROOM");
        };
        assert_eq!(room.name, "Living room 1");
        let house = interpret("a home", &DesignState::default(), &catalog);
        assert!(rooms(&house).iter().any(|r| r.name == "Living room"));
    }

    #[test]
    fn entrance_uses_catalog_direction() {
        let cmd = interpret("where should the door go", &DesignState::default(), &catalog());
        let CommandKind::AddEntrance(entrance) = &cmd.kind else {
            panic!("expected ADD_ENTRANCE");
        };
        assert_eq!(entrance.position.direction, Direction::Northeast);
        assert_eq!(entrance.dimensions, Dimensions::new(1.5, 2.5, 0.2));
    }

    #[test]
    fn unmatched_text_adds_a_bedroom() {
        let cmd = interpret("surprise me", &DesignState::default(), &catalog());
        let CommandKind::AddRoom(room) = &cmd.kind else {
            panic!("expected ADD_ROOM");
        };
        assert_eq!(room.room_type, RoomType::Bedroom);
        assert_eq!(room.position.direction, Direction::Southwest);
    }

    #[test]
    fn same_input_same_command() {
        let catalog = catalog();
        let state = DesignState::default();
        for text in ["Create a 4 bedroom house", "add a sofa", "a hall", "xyz"] {
            assert_eq!(
                interpret(text, &state, &catalog),
                interpret(text, &state, &catalog)
            );
        }
    }
}
