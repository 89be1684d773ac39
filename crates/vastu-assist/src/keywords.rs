//! Keyword tables for classifying free text. Order matters: the first entry
//! whose keywords appear in the text wins.

use regex::Regex;
use std::sync::LazyLock;
use vastu_core::{FurnitureType, RoomType};

/// What an utterance is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    House,
    Room,
    Kitchen,
    LivingRoom,
    Bathroom,
    Furniture,
    Entrance,
    /// Nothing matched.
    Generic,
}

pub const INTENTS: &[(Intent, &[&str])] = &[
    (Intent::House, &["house", "home"]),
    (Intent::Room, &["bedroom", "room"]),
    (Intent::Kitchen, &["kitchen"]),
    (Intent::LivingRoom, &["living", "hall"]),
    (Intent::Bathroom, &["bathroom", "toilet"]),
    (Intent::Furniture, &["furniture", "bed", "sofa"]),
    (Intent::Entrance, &["entrance", "door"]),
];

/// Refines a generic "room" request. Anything unmatched is a bedroom.
pub const ROOM_SUBTYPES: &[(RoomType, &[&str])] = &[
    (RoomType::Kitchen, &["kitchen"]),
    (RoomType::LivingRoom, &["living", "hall"]),
    (RoomType::Bathroom, &["bathroom", "toilet"]),
    (RoomType::StudyRoom, &["study"]),
    (RoomType::DiningRoom, &["dining"]),
    (RoomType::PoojaRoom, &["pooja", "puja", "prayer"]),
];

pub const FURNITURE: &[(FurnitureType, &[&str])] = &[
    (FurnitureType::Bed, &["bed"]),
    (FurnitureType::Sofa, &["sofa", "couch"]),
    (FurnitureType::Table, &["table"]),
    (FurnitureType::Chair, &["chair"]),
    (FurnitureType::Wardrobe, &["wardrobe", "closet"]),
];

pub const DEFAULT_BEDROOMS: usize = 2;
pub const MAX_BEDROOMS: usize = 8;

static BEDROOM_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*-?\s*bedroom").expect("bedroom count pattern"));

fn first_match<T: Copy>(table: &[(T, &[&str])], lower: &str) -> Option<T> {
    table
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(value, _)| *value)
}

/// Classify already lower-cased text.
pub fn classify(lower: &str) -> Intent {
    first_match(INTENTS, lower).unwrap_or(Intent::Generic)
}

pub fn room_subtype(lower: &str) -> RoomType {
    first_match(ROOM_SUBTYPES, lower).unwrap_or(RoomType::Bedroom)
}

pub fn furniture_type(lower: &str) -> FurnitureType {
    first_match(FURNITURE, lower).unwrap_or(FurnitureType::Bed)
}

/// Bedroom count from "3 bedroom" / "3-bedroom", clamped to 1..=MAX_BEDROOMS.
pub fn bedroom_count(lower: &str) -> usize {
    BEDROOM_COUNT
        .captures(lower)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .map(|n| n.clamp(1, MAX_BEDROOMS))
        .unwrap_or(DEFAULT_BEDROOMS)
}
