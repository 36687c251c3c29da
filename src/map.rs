use crate::config::{
    DOOR_TOLERANCE_TILES, DOOR_TRIGGER_SCALE, DOOR_WIDTH_TILES, WALL_MARGIN_TILES,
};
use crate::error::MapError;
use crate::types::Point;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

// Which wall of a zone an exit sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    North,
    South,
    East,
    West,
}

impl Side {
    // Unit vector pointing out of the zone through this wall
    pub fn outward(self) -> Point {
        match self {
            Side::North => Point::new(0.0, -1.0),
            Side::South => Point::new(0.0, 1.0),
            Side::East => Point::new(1.0, 0.0),
            Side::West => Point::new(-1.0, 0.0),
        }
    }

    fn is_horizontal_wall(self) -> bool {
        matches!(self, Side::North | Side::South)
    }
}

// Zone rectangle in tile units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Bounds {
    pub fn contains_tile(&self, tx: i64, ty: i64) -> bool {
        tx >= self.x && tx < self.x + self.width && ty >= self.y && ty < self.y + self.height
    }
}

// A door on one wall of a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exit {
    pub side: Side,
    pub connects_to: String,
    /// Tile offset of the door along its wall; centered when absent.
    #[serde(default)]
    pub door_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub bounds: Bounds,
    #[serde(default)]
    pub exits: Vec<Exit>,
    #[serde(default)]
    pub texture: Option<String>,
    #[serde(default = "default_lighting")]
    pub lighting: f32,
}

fn default_lighting() -> f32 {
    1.0
}

impl Zone {
    /// First tile of the door opening along its wall (absolute tile coordinate).
    pub fn door_start(&self, exit: &Exit) -> i64 {
        let b = &self.bounds;
        if exit.side.is_horizontal_wall() {
            b.x + exit.door_at.unwrap_or((b.width - DOOR_WIDTH_TILES) / 2)
        } else {
            b.y + exit.door_at.unwrap_or((b.height - DOOR_WIDTH_TILES) / 2)
        }
    }

    // Tile is strictly inside the bounds shrunk by the wall margin
    fn in_safe_zone(&self, tx: i64, ty: i64) -> bool {
        let b = &self.bounds;
        tx >= b.x + WALL_MARGIN_TILES
            && tx < b.x + b.width - WALL_MARGIN_TILES
            && ty >= b.y + WALL_MARGIN_TILES
            && ty < b.y + b.height - WALL_MARGIN_TILES
    }

    // Tile lies in the wall band cut out by one of this zone's doors
    fn on_door_opening(&self, tx: i64, ty: i64) -> bool {
        let b = &self.bounds;
        self.exits.iter().any(|exit| {
            let start = self.door_start(exit) - DOOR_TOLERANCE_TILES;
            let end = self.door_start(exit) + DOOR_WIDTH_TILES + DOOR_TOLERANCE_TILES;
            let (along, in_band) = match exit.side {
                Side::North => (tx, ty >= b.y && ty < b.y + WALL_MARGIN_TILES),
                Side::South => (
                    tx,
                    ty >= b.y + b.height - WALL_MARGIN_TILES && ty < b.y + b.height,
                ),
                Side::West => (ty, tx >= b.x && tx < b.x + WALL_MARGIN_TILES),
                Side::East => (
                    ty,
                    tx >= b.x + b.width - WALL_MARGIN_TILES && tx < b.x + b.width,
                ),
            };
            in_band && along >= start && along < end
        })
    }

    pub fn exit_to(&self, target: &str) -> Option<&Exit> {
        self.exits.iter().find(|exit| exit.connects_to == target)
    }
}

// Spawn location in tile coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub zone: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnKind {
    Slytherin,
    DarkWizard,
    DeathEater,
    Dementor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub zone: String,
    pub x: f64,
    pub y: f64,
    pub kind: SpawnKind,
}

// On-disk shape of a map; validated into `MapData`
#[derive(Debug, Deserialize)]
struct MapDescriptor {
    tile_size: f64,
    player_spawn: SpawnPoint,
    #[serde(default)]
    enemy_spawns: Vec<EnemySpawn>,
    zones: Vec<Zone>,
}

/// Result of a door trigger test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoorCrossing<'a> {
    pub exit: &'a Exit,
    pub target_zone: &'a str,
}

/// Static map model: zones, their doors, and spawn points. Immutable after load.
#[derive(Debug, Clone)]
pub struct MapData {
    pub tile_size: f64,
    pub zones: Vec<Zone>,
    pub player_spawn: SpawnPoint,
    pub enemy_spawns: Vec<EnemySpawn>,
    index: HashMap<String, usize>,
}

impl MapData {
    pub fn new(
        tile_size: f64,
        zones: Vec<Zone>,
        player_spawn: SpawnPoint,
        enemy_spawns: Vec<EnemySpawn>,
    ) -> Result<Self, MapError> {
        if !(tile_size > 0.0) {
            return Err(MapError::InvalidTileSize(tile_size));
        }
        if zones.is_empty() {
            return Err(MapError::NoZones);
        }

        let mut index = HashMap::with_capacity(zones.len());
        for (i, zone) in zones.iter().enumerate() {
            if zone.bounds.width <= 0 || zone.bounds.height <= 0 {
                return Err(MapError::EmptyBounds(zone.id.clone()));
            }
            if index.insert(zone.id.clone(), i).is_some() {
                return Err(MapError::DuplicateZone(zone.id.clone()));
            }
        }

        let map = MapData {
            tile_size,
            zones,
            player_spawn,
            enemy_spawns,
            index,
        };

        if map.zone(&map.player_spawn.zone).is_none() {
            return Err(MapError::UnknownSpawnZone(map.player_spawn.zone.clone()));
        }
        if let Some(bad) = map.enemy_spawns.iter().find(|s| map.zone(&s.zone).is_none()) {
            return Err(MapError::UnknownSpawnZone(bad.zone.clone()));
        }

        map.warn_on_broken_exits();
        info!(
            "Map loaded: {} zones, {} enemy spawns, tile size {}",
            map.zones.len(),
            map.enemy_spawns.len(),
            map.tile_size
        );
        Ok(map)
    }

    pub fn from_json(json: &str) -> Result<Self, MapError> {
        let desc: MapDescriptor = serde_json::from_str(json)?;
        Self::new(desc.tile_size, desc.zones, desc.player_spawn, desc.enemy_spawns)
    }

    pub fn load(path: &Path) -> Result<Self, MapError> {
        let content = fs::read_to_string(path).map_err(|source| MapError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    // Broken exits are tolerated at load and only fail the transition that uses them
    fn warn_on_broken_exits(&self) {
        for zone in &self.zones {
            for exit in &zone.exits {
                match self.zone(&exit.connects_to) {
                    None => warn!(
                        "Zone '{}' has a {:?} exit to unknown zone '{}'",
                        zone.id, exit.side, exit.connects_to
                    ),
                    Some(target) if target.exit_to(&zone.id).is_none() => warn!(
                        "Zone '{}' exits to '{}' but '{}' has no exit back",
                        zone.id, exit.connects_to, exit.connects_to
                    ),
                    Some(_) => {}
                }
            }
        }
    }

    pub fn zone(&self, id: &str) -> Option<&Zone> {
        self.index.get(id).map(|&i| &self.zones[i])
    }

    pub fn tile_of(&self, pos: Point) -> (i64, i64) {
        (
            (pos.x / self.tile_size).floor() as i64,
            (pos.y / self.tile_size).floor() as i64,
        )
    }

    // Converts tile coordinates to the world position of the tile's center
    pub fn grid_to_world(&self, tile_x: f64, tile_y: f64) -> Point {
        Point {
            x: (tile_x + 0.5) * self.tile_size,
            y: (tile_y + 0.5) * self.tile_size,
        }
    }

    pub fn player_spawn_position(&self) -> Point {
        self.grid_to_world(self.player_spawn.x, self.player_spawn.y)
    }

    /// Zone whose tile bounds contain the tile under `pos`.
    pub fn get_zone_at(&self, pos: Point) -> Option<&Zone> {
        let (tx, ty) = self.tile_of(pos);
        self.zones.iter().find(|z| z.bounds.contains_tile(tx, ty))
    }

    /// True when `pos` is blocked. A tile is open only inside its zone's inner
    /// safe area or on one of that zone's door openings; outside every zone is
    /// always blocked. Bodies are tested as points; the wall margin keeps
    /// an entity's radius clear of the drawn walls.
    pub fn check_collision(&self, pos: Point) -> bool {
        let (tx, ty) = self.tile_of(pos);
        match self.zones.iter().find(|z| z.bounds.contains_tile(tx, ty)) {
            Some(zone) => !(zone.in_safe_zone(tx, ty) || zone.on_door_opening(tx, ty)),
            None => true,
        }
    }

    /// World position of the middle of a door, on the zone edge.
    pub fn door_center(&self, zone: &Zone, exit: &Exit) -> Point {
        let b = &zone.bounds;
        let ts = self.tile_size;
        let along = (zone.door_start(exit) as f64 + DOOR_WIDTH_TILES as f64 / 2.0) * ts;
        match exit.side {
            Side::North => Point::new(along, b.y as f64 * ts),
            Side::South => Point::new(along, (b.y + b.height) as f64 * ts),
            Side::West => Point::new(b.x as f64 * ts, along),
            Side::East => Point::new((b.x + b.width) as f64 * ts, along),
        }
    }

    /// Tests `pos` against the trigger box of every exit of `zone_id` (or of
    /// the zone under `pos` if `zone_id` is unknown). The box is the door
    /// segment padded by 1.2 tile sizes on every side. The padding stands in
    /// for the entity radius, so only the centre point is tested.
    pub fn check_door_transition(&self, pos: Point, zone_id: &str) -> Option<DoorCrossing<'_>> {
        let zone = self.zone(zone_id).or_else(|| self.get_zone_at(pos))?;
        let pad = self.tile_size * DOOR_TRIGGER_SCALE;
        let half_door = DOOR_WIDTH_TILES as f64 * self.tile_size / 2.0;

        zone.exits.iter().find_map(|exit| {
            let center = self.door_center(zone, exit);
            let (half_w, half_h) = if exit.side.is_horizontal_wall() {
                (half_door + pad, pad)
            } else {
                (pad, half_door + pad)
            };
            let inside = (pos.x - center.x).abs() <= half_w && (pos.y - center.y).abs() <= half_h;
            inside.then_some(DoorCrossing {
                exit,
                target_zone: exit.connects_to.as_str(),
            })
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    fn zone(id: &str, bounds: Bounds, exits: Vec<Exit>) -> Zone {
        Zone {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            bounds,
            exits,
            texture: None,
            lighting: 1.0,
        }
    }

    fn exit(side: Side, to: &str, door_at: Option<i64>) -> Exit {
        Exit {
            side,
            connects_to: to.to_string(),
            door_at,
        }
    }

    /// hall (0,0 20x16) <-> corridor (20,0 12x16) through a door at tiles y 6..9.
    /// The corridor also has a one-way north exit into the attic.
    pub fn hall_and_corridor() -> MapData {
        let zones = vec![
            zone(
                "hall",
                Bounds { x: 0, y: 0, width: 20, height: 16 },
                vec![exit(Side::East, "corridor", Some(6))],
            ),
            zone(
                "corridor",
                Bounds { x: 20, y: 0, width: 12, height: 16 },
                vec![
                    exit(Side::West, "hall", Some(6)),
                    exit(Side::North, "attic", None),
                ],
            ),
            zone("attic", Bounds { x: 20, y: -10, width: 12, height: 10 }, vec![]),
        ];
        let spawn = SpawnPoint {
            zone: "hall".to_string(),
            x: 5.0,
            y: 7.0,
        };
        MapData::new(32.0, zones, spawn, Vec::new()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::hall_and_corridor;
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_get_zone_at() {
        let map = hall_and_corridor();
        assert_eq!(map.get_zone_at(Point::new(100.0, 100.0)).unwrap().id, "hall");
        assert_eq!(map.get_zone_at(Point::new(650.0, 100.0)).unwrap().id, "corridor");
        assert_eq!(map.get_zone_at(Point::new(650.0, -40.0)).unwrap().id, "attic");
        assert!(map.get_zone_at(Point::new(-5.0, 100.0)).is_none());
        assert!(map.get_zone_at(Point::new(100.0, 600.0)).is_none());
    }

    #[test]
    fn test_collision_margin_and_door_cutout() {
        let map = hall_and_corridor();
        // Inner safe area of the hall starts at tile 2
        assert!(!map.check_collision(Point::new(2.5 * 32.0, 5.5 * 32.0)));
        assert!(map.check_collision(Point::new(1.5 * 32.0, 5.5 * 32.0)));
        // East wall band (tiles 18..20) is blocked away from the door...
        assert!(map.check_collision(Point::new(18.5 * 32.0, 2.5 * 32.0)));
        // ...but open on the door rows 6..9, with one tile of tolerance
        assert!(!map.check_collision(Point::new(19.5 * 32.0, 7.5 * 32.0)));
        assert!(!map.check_collision(Point::new(19.5 * 32.0, 5.5 * 32.0)));
        assert!(!map.check_collision(Point::new(19.5 * 32.0, 9.5 * 32.0)));
        assert!(map.check_collision(Point::new(19.5 * 32.0, 10.5 * 32.0)));
        // Outside every zone
        assert!(map.check_collision(Point::new(-10.0, -10.0)));
    }

    #[test]
    fn test_door_center_and_default_offset() {
        let map = hall_and_corridor();
        let hall = map.zone("hall").unwrap();
        let center = map.door_center(hall, &hall.exits[0]);
        assert_approx_eq!(center.x, 640.0);
        assert_approx_eq!(center.y, 7.5 * 32.0);

        // Corridor north door is centered: (12 - 3) / 2 = 4 tiles in
        let corridor = map.zone("corridor").unwrap();
        let north = corridor.exit_to("attic").unwrap();
        assert_eq!(corridor.door_start(north), 24);
        let center = map.door_center(corridor, north);
        assert_approx_eq!(center.x, 25.5 * 32.0);
        assert_approx_eq!(center.y, 0.0);
    }

    #[test]
    fn test_door_trigger_box() {
        let map = hall_and_corridor();
        let near = map.check_door_transition(Point::new(610.0, 240.0), "hall");
        assert_eq!(near.map(|c| c.target_zone), Some("corridor"));

        // 1.2 tiles = 38.4 units of padding in front of the wall
        assert!(map.check_door_transition(Point::new(600.0, 240.0), "hall").is_none());
        // Beyond the door ends
        assert!(map.check_door_transition(Point::new(620.0, 140.0), "hall").is_none());
        // Unknown zone id falls back to the zone under the point
        let fallback = map.check_door_transition(Point::new(610.0, 240.0), "nowhere");
        assert_eq!(fallback.map(|c| c.target_zone), Some("corridor"));
    }

    #[test]
    fn test_map_validation() {
        let dup = r#"{
            "tile_size": 32,
            "player_spawn": { "zone": "a", "x": 3, "y": 3 },
            "zones": [
                { "id": "a", "name": "A", "bounds": { "x": 0, "y": 0, "width": 8, "height": 8 } },
                { "id": "a", "name": "A2", "bounds": { "x": 8, "y": 0, "width": 8, "height": 8 } }
            ]
        }"#;
        assert!(matches!(MapData::from_json(dup), Err(MapError::DuplicateZone(id)) if id == "a"));

        let bad_spawn = r#"{
            "tile_size": 32,
            "player_spawn": { "zone": "b", "x": 3, "y": 3 },
            "zones": [ { "id": "a", "name": "A", "bounds": { "x": 0, "y": 0, "width": 8, "height": 8 } } ]
        }"#;
        assert!(matches!(MapData::from_json(bad_spawn), Err(MapError::UnknownSpawnZone(_))));

        let zero_tile = r#"{
            "tile_size": 0,
            "player_spawn": { "zone": "a", "x": 3, "y": 3 },
            "zones": [ { "id": "a", "name": "A", "bounds": { "x": 0, "y": 0, "width": 8, "height": 8 } } ]
        }"#;
        assert!(matches!(MapData::from_json(zero_tile), Err(MapError::InvalidTileSize(_))));

        assert!(matches!(MapData::from_json("[]"), Err(MapError::Parse(_))));
    }

    #[test]
    fn test_parse_defaults() {
        let json = r#"{
            "tile_size": 16,
            "player_spawn": { "zone": "a", "x": 3, "y": 3 },
            "zones": [ { "id": "a", "name": "A", "bounds": { "x": 0, "y": 0, "width": 8, "height": 8 } } ]
        }"#;
        let map = MapData::from_json(json).unwrap();
        let zone = map.zone("a").unwrap();
        assert!(zone.exits.is_empty());
        assert!(zone.texture.is_none());
        assert_eq!(zone.lighting, 1.0);
        assert!(map.enemy_spawns.is_empty());
        let spawn = map.player_spawn_position();
        assert_approx_eq!(spawn.x, 56.0);
    }
}
