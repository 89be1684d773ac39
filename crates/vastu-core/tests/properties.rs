//! Properties that must hold for any reachable design.

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use vastu_core::{
    analyze, apply, from_blob, to_blob, Command, CommandKind, Compliance, DesignState, DirectEdit,
    Direction, FurnitureDraft, FurnitureType, Mode, Placement, RoomDraft, RoomPatch, RoomType,
    RuleCatalog, Transition, Vec3, HISTORY_LIMIT, UNASSIGNED,
};

const ROOM_TYPES: [RoomType; 8] = [
    RoomType::Bedroom,
    RoomType::Kitchen,
    RoomType::LivingRoom,
    RoomType::Bathroom,
    RoomType::DiningRoom,
    RoomType::StudyRoom,
    RoomType::PoojaRoom,
    RoomType::Other,
];

const FURNITURE_TYPES: [FurnitureType; 6] = [
    FurnitureType::Bed,
    FurnitureType::Sofa,
    FurnitureType::Table,
    FurnitureType::Chair,
    FurnitureType::Wardrobe,
    FurnitureType::Other,
];

#[derive(Debug, Clone)]
enum Op {
    AddRoom {
        room_type: RoomType,
        direction: Direction,
        x: f64,
        z: f64,
    },
    AddFurniture {
        furniture_type: FurnitureType,
        room: usize,
        yaw: f64,
    },
    MoveRoom {
        room: usize,
        direction: Direction,
    },
    DeleteRoom(usize),
    DeleteFurniture(usize),
    SetMode(Mode),
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (
            prop::sample::select(ROOM_TYPES.to_vec()),
            prop::sample::select(Direction::ALL.to_vec()),
            -6.0..6.0f64,
            -6.0..6.0f64,
        )
            .prop_map(|(room_type, direction, x, z)| Op::AddRoom { room_type, direction, x, z }),
        3 => (
            prop::sample::select(FURNITURE_TYPES.to_vec()),
            0usize..8,
            -10.0..10.0f64,
        )
            .prop_map(|(furniture_type, room, yaw)| Op::AddFurniture { furniture_type, room, yaw }),
        2 => (0usize..8, prop::sample::select(Direction::ALL.to_vec()))
            .prop_map(|(room, direction)| Op::MoveRoom { room, direction }),
        2 => (0usize..8).prop_map(Op::DeleteRoom),
        1 => (0usize..8).prop_map(Op::DeleteFurniture),
        1 => prop::sample::select(vec![Mode::Interior, Mode::Exterior, Mode::Landscape])
            .prop_map(Op::SetMode),
        1 => Just(Op::Clear),
    ]
}

fn stamp(i: usize) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(i as i64)
}

/// Ids that do not exist (index past the end) become dangling edits on purpose.
fn room_id(state: &DesignState, index: usize) -> String {
    state
        .rooms
        .get(index)
        .map(|r| r.id.clone())
        .unwrap_or_else(|| format!("room-missing-{index}"))
}

fn step(state: DesignState, op: &Op, i: usize) -> DesignState {
    let action: vastu_core::Action = match op {
        Op::AddRoom {
            room_type,
            direction,
            x,
            z,
        } => Command::new(CommandKind::AddRoom(RoomDraft {
            id: None,
            name: format!("{} {i}", room_type.label()),
            room_type: *room_type,
            position: Placement {
                x: *x,
                z: *z,
                direction: *direction,
            },
            dimensions: Default::default(),
            color: "#8b5cf6".into(),
            vastu_compliant: false,
            vastu_reason: String::new(),
        }))
        .into(),
        Op::AddFurniture {
            furniture_type,
            room,
            yaw,
        } => {
            let room_id = state
                .rooms
                .get(*room)
                .map(|r| r.id.clone())
                .unwrap_or_else(|| UNASSIGNED.to_string());
            Command::new(CommandKind::AddFurniture(FurnitureDraft {
                id: None,
                furniture_type: *furniture_type,
                room_id,
                position: Vec3::default(),
                rotation: Vec3 {
                    x: 0.0,
                    y: *yaw,
                    z: 0.0,
                },
                vastu_compliant: false,
                vastu_reason: String::new(),
            }))
            .into()
        }
        Op::MoveRoom { room, direction } => DirectEdit::UpdateRoom(RoomPatch {
            id: room_id(&state, *room),
            position: Some(vastu_core::rules::position_for(*direction)),
            ..RoomPatch::default()
        })
        .into(),
        Op::DeleteRoom(room) => DirectEdit::DeleteRoom(room_id(&state, *room)).into(),
        Op::DeleteFurniture(index) => DirectEdit::DeleteFurniture(
            state
                .furniture
                .get(*index)
                .map(|f| f.id.clone())
                .unwrap_or_else(|| format!("furniture-missing-{index}")),
        )
        .into(),
        Op::SetMode(mode) => DirectEdit::SetMode(*mode).into(),
        Op::Clear => DirectEdit::ClearDesign.into(),
    };
    apply(state, Transition::at(action, format!("op {i}"), stamp(i)))
}

fn build(ops: &[Op]) -> DesignState {
    ops.iter()
        .enumerate()
        .fold(DesignState::default(), |state, (i, op)| step(state, op, i))
}

proptest! {
    #[test]
    fn score_stays_in_range_and_label_matches(ops in prop::collection::vec(op(), 0..40)) {
        let state = build(&ops);
        let report = analyze(&state, &RuleCatalog::standard());
        prop_assert!(report.score <= 100);
        prop_assert_eq!(report.compliance, Compliance::from_score(report.score));
    }

    #[test]
    fn analysis_is_repeatable(ops in prop::collection::vec(op(), 0..40)) {
        let state = build(&ops);
        let catalog = RuleCatalog::standard();
        prop_assert_eq!(analyze(&state, &catalog), analyze(&state, &catalog));
    }

    #[test]
    fn furniture_only_points_at_live_rooms(ops in prop::collection::vec(op(), 0..60)) {
        let state = build(&ops);
        for item in &state.furniture {
            prop_assert!(
                item.room_id == UNASSIGNED || state.room(&item.room_id).is_some(),
                "{} points at missing room {}", item.id, item.room_id
            );
        }
    }

    #[test]
    fn delete_room_removes_its_furniture(
        ops in prop::collection::vec(op(), 1..40),
        pick in 0usize..8,
    ) {
        let state = build(&ops);
        prop_assume!(!state.rooms.is_empty());
        let id = state.rooms[pick % state.rooms.len()].id.clone();
        let owned = state.furniture.iter().filter(|f| f.room_id == id).count();
        let rooms = state.rooms.len();
        let furniture = state.furniture.len();

        let after = apply(
            state,
            Transition::at(DirectEdit::DeleteRoom(id.clone()), "delete", stamp(1000)),
        );
        prop_assert!(after.furniture.iter().all(|f| f.room_id != id));
        prop_assert_eq!(after.rooms.len(), rooms - 1);
        prop_assert_eq!(after.furniture.len(), furniture - owned);
        prop_assert!(after.unsaved_changes);
    }

    #[test]
    fn history_keeps_latest_entries_in_order(extra in 0usize..30) {
        let total = HISTORY_LIMIT + extra;
        let ops: Vec<Op> = (0..total).map(|_| Op::SetMode(Mode::Exterior)).collect();
        let state = build(&ops);
        prop_assert_eq!(state.history.len(), HISTORY_LIMIT);
        let inputs: Vec<String> = state.history.iter().map(|h| h.input.clone()).collect();
        let expected: Vec<String> = (total - HISTORY_LIMIT..total).map(|i| format!("op {i}")).collect();
        prop_assert_eq!(inputs, expected);
    }

    #[test]
    fn blob_round_trip_is_lossless(ops in prop::collection::vec(op(), 0..40)) {
        let mut state = build(&ops);
        state.compliance_report = analyze(&state, &RuleCatalog::standard());
        let blob = to_blob(&state).unwrap();
        prop_assert_eq!(from_blob(&blob).unwrap(), state);
    }

    #[test]
    fn label_thresholds(score in 0u8..=100) {
        let expected = if score >= 90 {
            Compliance::Excellent
        } else if score >= 70 {
            Compliance::Good
        } else if score >= 50 {
            Compliance::Fair
        } else {
            Compliance::Poor
        };
        prop_assert_eq!(Compliance::from_score(score), expected);
    }
}
