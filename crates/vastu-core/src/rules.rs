//! Vastu rule catalog: the single source of placement knowledge for both the
//! interpreter (where to put things) and the analyzer (how well they were put).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::{Dimensions, Direction, FurnitureType, Placement, RoomType};

use Direction::*;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
    schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Water,
    Earth,
    Air,
    Space,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomRule {
    /// Most preferred first.
    pub preferred_directions: Vec<Direction>,
    pub avoid_directions: Vec<Direction>,
    pub element: Element,
    pub description: String,
    pub colors: Vec<String>,
    pub avoid_colors: Vec<String>,
    /// Color used when the room is drawn.
    pub display_color: String,
    pub dimensions: Dimensions,
    /// Completes "<Room> in <direction> ...".
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FurnitureRule {
    /// Walls or zones of the room the piece belongs against.
    pub preferred_directions: Vec<Direction>,
    pub avoid_directions: Vec<Direction>,
    /// Directions the piece may face.
    pub facing: Vec<Direction>,
    pub element: Element,
    pub placement: String,
    pub direction: String,
    pub avoid: String,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntranceRule {
    pub preferred_directions: Vec<Direction>,
    pub avoid_directions: Vec<Direction>,
    pub description: String,
    pub dimensions: Dimensions,
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementRule {
    pub direction: Direction,
    pub rooms: Vec<String>,
    pub colors: Vec<String>,
    pub avoid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuleCatalog {
    pub rooms: BTreeMap<RoomType, RoomRule>,
    pub furniture: BTreeMap<FurnitureType, FurnitureRule>,
    pub entrance: EntranceRule,
    pub palette: BTreeMap<Direction, Vec<String>>,
    pub elements: BTreeMap<Element, ElementRule>,
    pub principles: Vec<String>,
    pub default_room: RoomRule,
    pub default_furniture: FurnitureRule,
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Fixed plan coordinates for each zone, used whenever a room is placed by direction.
pub fn position_for(direction: Direction) -> Placement {
    let (x, z) = match direction {
        North => (0.0, 3.0),
        South => (0.0, -3.0),
        East => (3.0, 0.0),
        West => (-3.0, 0.0),
        Northeast => (2.0, 2.0),
        Northwest => (-2.0, 2.0),
        Southeast => (2.0, -2.0),
        Southwest => (-2.0, -2.0),
        Center => (0.0, 0.0),
    };
    Placement { x, z, direction }
}

impl RuleCatalog {
    /// Read a catalog from a JSON file.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Rules for a room type; unknown types get the neutral default entry.
    pub fn room(&self, room_type: RoomType) -> &RoomRule {
        self.rooms.get(&room_type).unwrap_or(&self.default_room)
    }

    pub fn furniture(&self, furniture_type: FurnitureType) -> &FurnitureRule {
        self.furniture
            .get(&furniture_type)
            .unwrap_or(&self.default_furniture)
    }

    pub fn entrance(&self) -> &EntranceRule {
        &self.entrance
    }

    pub fn palette(&self, direction: Direction) -> &[String] {
        self.palette
            .get(&direction)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn element(&self, element: Element) -> Option<&ElementRule> {
        self.elements.get(&element)
    }

    /// The zone a room type should go in, or north when the catalog has no preference.
    pub fn preferred_direction(&self, room_type: RoomType) -> Direction {
        self.room(room_type)
            .preferred_directions
            .first()
            .copied()
            .unwrap_or(North)
    }

    pub fn is_preferred(&self, room_type: RoomType, direction: Direction) -> bool {
        self.room(room_type)
            .preferred_directions
            .contains(&direction)
    }

    pub fn entrance_direction(&self) -> Direction {
        self.entrance
            .preferred_directions
            .first()
            .copied()
            .unwrap_or(North)
    }

    /// "Kitchen in southeast for fire element and cooking facing east".
    pub fn room_reason(&self, room_type: RoomType, direction: Direction) -> String {
        let rule = self.room(room_type);
        let label = match room_type {
            RoomType::Other => "Room".to_string(),
            t => t.title(),
        };
        format!("{label} in {direction} {}", rule.rationale)
    }

    /// Compact text of the core placement rules, for prompts and tool output.
    pub fn prompt_rules(&self) -> String {
        let mut out = String::with_capacity(1024);
        out.push_str("ROOM PLACEMENT RULES:\n");
        for (room_type, rule) in &self.rooms {
            out.push_str("- ");
            out.push_str(&room_type.title());
            out.push_str(": prefer ");
            out.push_str(&join_directions(&rule.preferred_directions, ", "));
            if !rule.avoid_directions.is_empty() {
                out.push_str("; avoid ");
                out.push_str(&join_directions(&rule.avoid_directions, ", "));
            }
            out.push_str(". ");
            out.push_str(&rule.description);
            out.push('\n');
        }
        out.push_str("- Main entrance: prefer ");
        out.push_str(&join_directions(&self.entrance.preferred_directions, ", "));
        out.push_str("; avoid ");
        out.push_str(&join_directions(&self.entrance.avoid_directions, ", "));
        out.push('\n');

        out.push_str("ELEMENTS:\n");
        for (element, rule) in &self.elements {
            out.push_str(&format!(
                "- {:?} governs the {}: {}\n",
                element,
                rule.direction,
                rule.rooms.join(", ")
            ));
        }

        out.push_str("FURNITURE:\n");
        for (furniture_type, rule) in &self.furniture {
            out.push_str(&format!(
                "- {}: {}. {}\n",
                furniture_type.as_str(),
                rule.placement,
                rule.direction
            ));
        }
        out
    }

    pub fn standard() -> Self {
        let mut rooms = BTreeMap::new();
        rooms.insert(
            RoomType::Bedroom,
            room_rule(
                &[Southwest, South, West],
                &[Northeast, Southeast],
                Element::Earth,
                "Master bedroom should be in southwest, children bedrooms in west or south",
                &["light blue", "green", "pink", "white"],
                &["red", "black"],
                "#8b5cf6",
                Dimensions::new(3.0, 3.0, 3.0),
                "for rest and stability",
            ),
        );
        rooms.insert(
            RoomType::Kitchen,
            room_rule(
                &[Southeast, East],
                &[Northeast, Northwest, Southwest],
                Element::Fire,
                "Kitchen should be in southeast corner with cooking facing east",
                &["yellow", "orange", "red", "pink"],
                &["blue", "black"],
                "#f59e0b",
                Dimensions::new(3.0, 3.0, 3.0),
                "for fire element and cooking facing east",
            ),
        );
        rooms.insert(
            RoomType::LivingRoom,
            room_rule(
                &[Northeast, North, East],
                &[Southwest],
                Element::Water,
                "Living room should be in northeast for positive energy and social harmony",
                &["white", "light yellow", "light green", "light blue"],
                &["dark colors", "red"],
                "#10b981",
                Dimensions::new(5.0, 3.0, 4.0),
                "for positive energy and social harmony",
            ),
        );
        rooms.insert(
            RoomType::Bathroom,
            room_rule(
                &[Northwest, West, South],
                &[Northeast, East, Center],
                Element::Water,
                "Bathrooms should be in northwest or west, never in northeast",
                &["white", "light blue", "light green"],
                &["red", "black", "dark blue"],
                "#3b82f6",
                Dimensions::new(2.0, 3.0, 2.0),
                "for water element placement",
            ),
        );
        rooms.insert(
            RoomType::DiningRoom,
            room_rule(
                &[East, West, North],
                &[South],
                Element::Earth,
                "Dining room should be adjacent to kitchen, facing east while eating",
                &["light green", "yellow", "orange"],
                &["blue", "black"],
                "#84cc16",
                Dimensions::new(4.0, 3.0, 3.0),
                "for nourishment and family bonding",
            ),
        );
        rooms.insert(
            RoomType::StudyRoom,
            room_rule(
                &[Northeast, East, North],
                &[Southwest],
                Element::Water,
                "Study room should be in northeast for enhanced concentration and learning",
                &["white", "light yellow", "light green"],
                &["red", "black"],
                "#06b6d4",
                Dimensions::new(3.0, 3.0, 3.0),
                "for enhanced concentration and learning",
            ),
        );
        rooms.insert(
            RoomType::PoojaRoom,
            room_rule(
                &[Northeast, East],
                &[South, Southwest, Northwest],
                Element::Water,
                "Prayer room should be in northeast corner for spiritual energy",
                &["white", "light yellow", "saffron"],
                &["black", "red", "blue"],
                "#eab308",
                Dimensions::new(2.0, 3.0, 2.0),
                "for spiritual energy",
            ),
        );

        let mut furniture = BTreeMap::new();
        furniture.insert(
            FurnitureType::Bed,
            furniture_rule(
                &[Southwest, South, West],
                &[Northeast],
                &[East, North],
                Element::Earth,
                "Place bed in southwest corner of bedroom",
                "Head should be towards south or east while sleeping",
                "Never place bed under a beam or in front of mirror",
                "Bed positioned with head towards south/east for better sleep",
            ),
        );
        furniture.insert(
            FurnitureType::Sofa,
            furniture_rule(
                &[South, West],
                &[Center],
                &[North, East],
                Element::Earth,
                "Place sofa against south or west wall",
                "Should face north or east",
                "Avoid placing sofa in center of room",
                "Sofa facing north/east for positive energy",
            ),
        );
        furniture.insert(
            FurnitureType::Table,
            furniture_rule(
                &[East, West],
                &[],
                &[East, North],
                Element::Earth,
                "Place table in east or west portion of the room",
                "Face east or north while seated",
                "Avoid irregular shaped tables",
                "Table positioned for optimal functionality and energy flow",
            ),
        );
        furniture.insert(
            FurnitureType::Chair,
            furniture_rule(
                &[South, West],
                &[],
                &[East, North],
                Element::Earth,
                "Place chairs along south or west side",
                "Sit facing east or north",
                "Avoid seating with back to the door",
                "Chair positioned for comfort and positive energy",
            ),
        );
        furniture.insert(
            FurnitureType::Wardrobe,
            furniture_rule(
                &[South, West],
                &[Northeast],
                &[North, East],
                Element::Earth,
                "Place in south or west wall",
                "Opening should face north or east",
                "Avoid placing in northeast corner",
                "Wardrobe placed against south/west wall",
            ),
        );
        furniture.insert(
            FurnitureType::DiningTable,
            furniture_rule(
                &[East, West],
                &[],
                &[East],
                Element::Earth,
                "Place in east or west portion of dining room",
                "Face east while eating",
                "Avoid irregular shaped tables",
                "Dining table placed for nourishment while facing east",
            ),
        );
        furniture.insert(
            FurnitureType::StudyTable,
            furniture_rule(
                &[East, North],
                &[],
                &[East, North],
                Element::Water,
                "Place in east or north wall",
                "Face east or north while studying",
                "Avoid placing back towards door",
                "Study table facing east/north for concentration",
            ),
        );

        let entrance = EntranceRule {
            preferred_directions: vec![Northeast, North, East],
            avoid_directions: vec![Southwest, South],
            description: "Main entrance should be in northeast for prosperity".into(),
            dimensions: Dimensions::new(1.5, 2.5, 0.2),
            colors: strings(&["natural wood", "light colors"]),
        };

        let palette = [
            (Northeast, &["white", "light yellow", "light blue", "light green"][..]),
            (East, &["white", "light green", "light blue"][..]),
            (Southeast, &["orange", "red", "pink", "yellow"][..]),
            (South, &["red", "orange", "pink"][..]),
            (Southwest, &["yellow", "brown", "beige"][..]),
            (West, &["white", "yellow", "light blue"][..]),
            (Northwest, &["white", "light blue", "grey"][..]),
            (North, &["white", "light green", "light blue"][..]),
            (Center, &["white", "light yellow"][..]),
        ]
        .into_iter()
        .map(|(d, colors)| (d, strings(colors)))
        .collect();

        let elements = [
            (Element::Fire, Southeast, &["kitchen"][..], &["red", "orange", "yellow"][..], "northeast, northwest"),
            (Element::Water, Northeast, &["bathroom", "well"][..], &["blue", "white"][..], "southeast, southwest"),
            (Element::Earth, Southwest, &["bedroom", "storage"][..], &["yellow", "brown"][..], "northeast"),
            (Element::Air, Northwest, &["guest_room"][..], &["white", "grey"][..], "southeast"),
            (Element::Space, Center, &["courtyard", "hall"][..], &["white"][..], "heavy structures"),
        ]
        .into_iter()
        .map(|(e, direction, rooms, colors, avoid)| {
            (
                e,
                ElementRule {
                    direction,
                    rooms: strings(rooms),
                    colors: strings(colors),
                    avoid: avoid.to_string(),
                },
            )
        })
        .collect();

        let principles = strings(&[
            "Keep center of house open and clutter-free",
            "Maximize natural light, especially from east",
            "Ensure good cross-ventilation",
            "Avoid clutter, especially in northeast",
            "Place mirrors on north or east walls",
            "Keep plants in east or north, avoid thorny plants inside",
            "Store water in northeast",
            "Place heavy furniture in south or west",
        ]);

        Self {
            rooms,
            furniture,
            entrance,
            palette,
            elements,
            principles,
            default_room: room_rule(
                &[],
                &[],
                Element::Space,
                "No specific Vastu guidance for this room type",
                &["white"],
                &[],
                "#6b7280",
                Dimensions::default(),
                "following Vastu principles",
            ),
            default_furniture: furniture_rule(
                &[],
                &[],
                &[],
                Element::Space,
                "Place where it does not block movement",
                "No preferred facing",
                "Avoid clutter",
                "Furniture positioned following Vastu guidelines",
            ),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn room_rule(
    preferred: &[Direction],
    avoid: &[Direction],
    element: Element,
    description: &str,
    colors: &[&str],
    avoid_colors: &[&str],
    display_color: &str,
    dimensions: Dimensions,
    rationale: &str,
) -> RoomRule {
    RoomRule {
        preferred_directions: preferred.to_vec(),
        avoid_directions: avoid.to_vec(),
        element,
        description: description.to_string(),
        colors: strings(colors),
        avoid_colors: strings(avoid_colors),
        display_color: display_color.to_string(),
        dimensions,
        rationale: rationale.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn furniture_rule(
    preferred: &[Direction],
    avoid: &[Direction],
    facing: &[Direction],
    element: Element,
    placement: &str,
    direction: &str,
    avoid_note: &str,
    rationale: &str,
) -> FurnitureRule {
    FurnitureRule {
        preferred_directions: preferred.to_vec(),
        avoid_directions: avoid.to_vec(),
        facing: facing.to_vec(),
        element,
        placement: placement.to_string(),
        direction: direction.to_string(),
        avoid: avoid_note.to_string(),
        rationale: rationale.to_string(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub(crate) fn join_directions(directions: &[Direction], sep: &str) -> String {
    directions
        .iter()
        .map(|d| d.as_str())
        .collect::<Vec<_>>()
        .join(sep)
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
