//! JSON-backed asset catalog.
//!
//! [`AssetCatalog`] implements all three provider traits from a simple
//! description of each creature asset. It backs the demo binary and the
//! tests; real hosts usually plug in their own providers over the actual
//! asset format.
//!
//! # File Format
//!
//! ```json
//! {
//!   "assets": [
//!     {
//!       "id": "ogre",
//!       "speed": 2.5,
//!       "space": 18,
//!       "style": "standard",
//!       "directions": ["S", "SW", "W", "NW", "N", "NE", "E", "SE"],
//!       "sequences": { "walk": 10, "stand": 8, "attack1": 12 },
//!       "bounds": { "left": -20, "top": -60, "right": 20, "bottom": 8 }
//!     }
//!   ]
//! }
//! ```
//!
//! `animatable` defaults to true, `directions` to all sixteen headings and
//! `style` to `standard`. Without `bounds`, frames are treated as a square of
//! the personal-space radius.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::components::direction::{DIRECTION_COUNT, Direction};
use crate::components::sequence::{AnimationStyle, Sequence};
use crate::resources::providers::{
    AssetError, AssetId, AssetPool, FrameBounds, FrameProvider, Motion, MotionProvider,
};

const BUILTIN_CATALOG: &str = r#"{
  "assets": [
    {
      "id": "ogre",
      "speed": 2.5,
      "space": 18,
      "directions": ["S", "SW", "W", "NW", "N", "NE", "E", "SE"],
      "sequences": {
        "walk": 10, "stand": 8, "ready": 8, "attack1": 12, "attack2": 12,
        "attack_slash": 10, "cast": 6, "spell": 9, "head_turn": 8
      },
      "bounds": { "left": -20, "top": -60, "right": 20, "bottom": 8 }
    },
    {
      "id": "imp",
      "speed": 3.5,
      "space": 10,
      "style": "fidget",
      "sequences": {
        "walk": 8, "run": 8, "stand": 6, "stand_fidget1": 10, "stand_fidget2": 12,
        "stance": 6, "stance_fidget1": 9, "stance_fidget2": 9, "attack_jab": 7
      },
      "bounds": { "left": -12, "top": -30, "right": 12, "bottom": 4 }
    },
    {
      "id": "wisp",
      "speed": 1.5,
      "space": 8,
      "directions": ["S", "W", "N", "E"],
      "sequences": { "walk": 12, "stand": 12, "cast1": 8, "spell1": 8 }
    },
    {
      "id": "mimic",
      "animatable": false,
      "speed": 0,
      "space": 14,
      "sequences": { "stand": 4 }
    }
  ]
}"#;

fn default_true() -> bool {
    true
}

fn all_directions() -> Vec<Direction> {
    Direction::ALL.to_vec()
}

/// Description of one creature asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetEntry {
    pub id: String,
    #[serde(default = "default_true")]
    pub animatable: bool,
    pub speed: f64,
    pub space: f64,
    #[serde(default)]
    pub style: AnimationStyle,
    #[serde(default = "all_directions")]
    pub directions: Vec<Direction>,
    /// Cycle length per sequence.
    pub sequences: FxHashMap<Sequence, u32>,
    #[serde(default)]
    pub bounds: Option<FrameBounds>,
}

impl AssetEntry {
    /// Entry with every direction and only a walking cycle.
    pub fn walker(id: impl Into<String>, speed: f64, space: f64, walk_frames: u32) -> Self {
        let mut sequences = FxHashMap::default();
        sequences.insert(Sequence::Walk, walk_frames);
        AssetEntry {
            id: id.into(),
            animatable: true,
            speed,
            space,
            style: AnimationStyle::Standard,
            directions: all_directions(),
            sequences,
            bounds: None,
        }
    }

    pub fn with_sequence(mut self, sequence: Sequence, frames: u32) -> Self {
        self.sequences.insert(sequence, frames);
        self
    }

    pub fn with_style(mut self, style: AnimationStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_directions(mut self, directions: &[Direction]) -> Self {
        self.directions = directions.to_vec();
        self
    }

    pub fn with_bounds(mut self, bounds: FrameBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_animatable(mut self, animatable: bool) -> Self {
        self.animatable = animatable;
        self
    }

    /// Heuristic validity check applied on top of the `animatable` flag.
    fn is_sane(&self) -> bool {
        self.speed.is_finite()
            && self.speed >= 0.0
            && self.space.is_finite()
            && self.space >= 0.0
            && !self.directions.is_empty()
            && self.sequences.get(&Sequence::Walk).is_some_and(|&n| n > 0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogData {
    assets: Vec<AssetEntry>,
}

/// In-memory asset catalog.
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    entries: FxHashMap<AssetId, AssetEntry>,
    order: Vec<AssetId>,
}

impl AssetCatalog {
    /// Build from entries. Later duplicates of an id replace earlier ones.
    pub fn new(entries: Vec<AssetEntry>) -> Self {
        let mut catalog = AssetCatalog::default();
        for entry in entries {
            let id: AssetId = entry.id.as_str().into();
            if catalog.entries.insert(id.clone(), entry).is_none() {
                catalog.order.push(id);
            }
        }
        catalog
    }

    /// Catalog compiled into the binary, used when no file is given.
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_CATALOG).unwrap_or_else(|e| {
            log::error!("built-in catalog is invalid: {}", e);
            AssetCatalog::default()
        })
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let data: CatalogData = serde_json::from_str(json)?;
        Ok(Self::new(data.assets))
    }

    /// Loads a catalog from a JSON file at `path`.
    pub fn load_from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let file_content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&file_content)?;
        log::info!("Loaded {} assets from {}", catalog.len(), path);
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn entry(&self, asset: &AssetId) -> Result<&AssetEntry, AssetError> {
        self.entries
            .get(asset)
            .ok_or_else(|| AssetError::Missing(asset.clone()))
    }
}

impl AssetPool for AssetCatalog {
    fn list_candidate_assets(&self) -> Vec<AssetId> {
        self.order.clone()
    }

    fn is_animatable(&self, asset: &AssetId) -> bool {
        self.entries
            .get(asset)
            .is_some_and(|entry| entry.animatable && entry.is_sane())
    }
}

impl FrameProvider for AssetCatalog {
    fn cycle_length(
        &self,
        asset: &AssetId,
        sequence: Sequence,
        direction: Direction,
    ) -> Result<u32, AssetError> {
        let entry = self.entry(asset)?;
        if !entry.directions.contains(&direction) {
            return Err(AssetError::Malformed {
                asset: asset.clone(),
                reason: format!("no frames for direction {:?}", direction),
            });
        }
        entry
            .sequences
            .get(&sequence)
            .copied()
            .filter(|&n| n > 0)
            .ok_or_else(|| AssetError::NoCycle {
                asset: asset.clone(),
                sequence,
            })
    }

    fn frame_bounds(
        &self,
        asset: &AssetId,
        _sequence: Sequence,
        _direction: Direction,
        _index: u32,
    ) -> Option<FrameBounds> {
        self.entries.get(asset).and_then(|entry| entry.bounds)
    }

    fn is_sequence_available(&self, asset: &AssetId, sequence: Sequence) -> bool {
        self.entries
            .get(asset)
            .and_then(|entry| entry.sequences.get(&sequence))
            .is_some_and(|&n| n > 0)
    }

    /// Nearest defined direction; on a tie the clockwise neighbour wins.
    fn existing_direction(&self, asset: &AssetId, requested: Direction) -> Direction {
        let Some(entry) = self.entries.get(asset) else {
            return requested;
        };
        if entry.directions.is_empty() || entry.directions.contains(&requested) {
            return requested;
        }
        (1..=(DIRECTION_COUNT as i32 / 2))
            .flat_map(|step| [requested.rotated(step), requested.rotated(-step)])
            .find(|dir| entry.directions.contains(dir))
            .unwrap_or(requested)
    }

    fn animation_style(&self, asset: &AssetId) -> AnimationStyle {
        self.entries
            .get(asset)
            .map(|entry| entry.style)
            .unwrap_or_default()
    }
}

impl MotionProvider for AssetCatalog {
    fn motion(&self, asset: &AssetId) -> Result<Motion, AssetError> {
        let entry = self.entry(asset)?;
        Ok(Motion {
            speed: entry.speed,
            space: entry.space,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> AssetId {
        s.into()
    }

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = AssetCatalog::builtin();
        assert_eq!(catalog.len(), 4);
        assert!(catalog.is_animatable(&id("ogre")));
        assert!(catalog.is_animatable(&id("imp")));
        assert!(!catalog.is_animatable(&id("mimic")));
        assert_eq!(catalog.animation_style(&id("imp")), AnimationStyle::Fidget);
    }

    #[test]
    fn test_unknown_asset_errors() {
        let catalog = AssetCatalog::builtin();
        assert!(matches!(catalog.motion(&id("dragon")), Err(AssetError::Missing(_))));
        assert!(!catalog.is_animatable(&id("dragon")));
    }

    #[test]
    fn test_existing_direction_substitution() {
        let catalog = AssetCatalog::new(vec![
            AssetEntry::walker("wisp", 1.0, 8.0, 4).with_directions(&[
                Direction::S,
                Direction::W,
                Direction::N,
                Direction::E,
            ]),
        ]);
        let wisp = id("wisp");
        assert_eq!(catalog.existing_direction(&wisp, Direction::W), Direction::W);
        assert_eq!(catalog.existing_direction(&wisp, Direction::WSW), Direction::W);
        assert_eq!(catalog.existing_direction(&wisp, Direction::SSW), Direction::S);
        // SW is equidistant from S and W: clockwise neighbour wins
        assert_eq!(catalog.existing_direction(&wisp, Direction::SW), Direction::W);
    }

    #[test]
    fn test_cycle_length_requires_existing_direction() {
        let catalog = AssetCatalog::new(vec![
            AssetEntry::walker("wisp", 1.0, 8.0, 4).with_directions(&[Direction::S]),
        ]);
        assert_eq!(catalog.cycle_length(&id("wisp"), Sequence::Walk, Direction::S), Ok(4));
        assert!(catalog.cycle_length(&id("wisp"), Sequence::Walk, Direction::N).is_err());
        assert!(matches!(
            catalog.cycle_length(&id("wisp"), Sequence::Cast, Direction::S),
            Err(AssetError::NoCycle { .. })
        ));
    }

    #[test]
    fn test_asset_without_walk_is_not_animatable() {
        let mut entry = AssetEntry::walker("statue", 0.0, 5.0, 4);
        entry.sequences.clear();
        entry.sequences.insert(Sequence::Stand, 1);
        let catalog = AssetCatalog::new(vec![entry]);
        assert!(!catalog.is_animatable(&id("statue")));
    }

    #[test]
    fn test_duplicate_ids_keep_first_position() {
        let catalog = AssetCatalog::new(vec![
            AssetEntry::walker("a", 1.0, 1.0, 1),
            AssetEntry::walker("b", 1.0, 1.0, 1),
            AssetEntry::walker("a", 9.0, 1.0, 1),
        ]);
        assert_eq!(catalog.list_candidate_assets(), vec![id("a"), id("b")]);
        assert_eq!(catalog.motion(&id("a")).unwrap().speed, 9.0);
    }

    #[test]
    fn test_json_round_trip_of_entry_fields() {
        let json = r#"{ "assets": [ { "id": "bat", "speed": 4, "space": 6,
            "sequences": { "walk": 6, "stand_fidget1": 3 },
            "bounds": { "left": -6, "top": -6, "right": 6, "bottom": 6 } } ] }"#;
        let catalog = AssetCatalog::from_json(json).unwrap();
        let bat = id("bat");
        assert!(catalog.is_sequence_available(&bat, Sequence::StandFidget1));
        assert!(!catalog.is_sequence_available(&bat, Sequence::Stand));
        assert_eq!(
            catalog.frame_bounds(&bat, Sequence::Walk, Direction::S, 0),
            Some(FrameBounds::square(6.0))
        );
    }
}
