use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered `[lng, lat]` vertices of one polygon ring. Closing the ring
/// (repeating the first vertex) is optional.
pub type Ring = Vec<[f64; 2]>;

/// Depth in the administrative hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Level {
    Province = 0,
    City = 1,
    District = 2,
}

impl Level {
    /// All levels, shallowest first.
    pub const ALL: [Level; 3] = [Level::Province, Level::City, Level::District];

    pub fn depth(self) -> usize {
        self as usize
    }

    pub fn from_depth(depth: u8) -> Option<Self> {
        match depth {
            0 => Some(Level::Province),
            1 => Some(Level::City),
            2 => Some(Level::District),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Level {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Level::from_depth(value).ok_or_else(|| format!("unknown region level {}", value))
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level as u8
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Province => "province",
            Level::City => "city",
            Level::District => "district",
        };
        f.write_str(name)
    }
}

/// Logical shape of one administrative boundary as handed over by a loader.
///
/// `rings` holds the primary polygon: the first ring is the outer boundary and
/// any further rings are holes. Regions made of several disjoint pieces
/// (islands, exclaves) carry the other pieces in `additional_parts`, each with
/// the same outer-then-holes layout.
///
/// # Examples
///
/// ```
/// use geolocate_types::region::{Level, RegionRecord};
///
/// let district = RegionRecord::new(
///     450481,
///     Level::District,
///     "Cenxi",
///     vec![vec![[110.9, 22.8], [111.1, 22.8], [111.1, 23.0], [110.9, 23.0]]],
/// )
/// .with_parent(450400)
/// .with_path("Guangxi Wuzhou Cenxi");
///
/// assert_eq!(district.parent_id, Some(450400));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub id: u64,
    #[serde(default)]
    pub parent_id: Option<u64>,
    pub level: Level,
    pub name: String,
    /// Space separated names from the province down, e.g. "Shanghai Shanghai Pudong"
    #[serde(default)]
    pub path: Option<String>,
    /// Representative `[lng, lat]`; the bbox centre is used when absent
    #[serde(default)]
    pub center: Option<[f64; 2]>,
    pub rings: Vec<Ring>,
    #[serde(default)]
    pub additional_parts: Vec<Vec<Ring>>,
}

impl RegionRecord {
    pub fn new(id: u64, level: Level, name: impl Into<String>, rings: Vec<Ring>) -> Self {
        Self {
            id,
            parent_id: None,
            level,
            name: name.into(),
            path: None,
            center: None,
            rings,
            additional_parts: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: u64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_center(mut self, lng: f64, lat: f64) -> Self {
        self.center = Some([lng, lat]);
        self
    }

    /// Add another disjoint piece (outer ring first, then holes).
    pub fn with_part(mut self, rings: Vec<Ring>) -> Self {
        self.additional_parts.push(rings);
        self
    }

    /// Primary polygon followed by the additional parts.
    pub fn parts(&self) -> impl Iterator<Item = &[Ring]> {
        std::iter::once(self.rings.as_slice()).chain(self.additional_parts.iter().map(Vec::as_slice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_roundtrip_through_depth() {
        for level in Level::ALL {
            assert_eq!(Level::from_depth(level.into()), Some(level));
        }
        assert!(Level::try_from(3u8).is_err());
        assert_eq!(Level::District.to_string(), "district");
    }

    #[test]
    fn test_record_from_json() {
        let json = r#"{
            "id": 310115,
            "parent_id": 310100,
            "level": 2,
            "name": "Pudong",
            "rings": [[[121.5, 31.1], [121.9, 31.1], [121.9, 31.4], [121.5, 31.4]]]
        }"#;
        let record: RegionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.level, Level::District);
        assert_eq!(record.rings[0].len(), 4);
        assert!(record.additional_parts.is_empty());
        assert_eq!(record.parts().count(), 1);
    }

    #[test]
    fn test_rejects_unknown_level() {
        let json = r#"{"id": 1, "level": 7, "name": "x", "rings": []}"#;
        assert!(serde_json::from_str::<RegionRecord>(json).is_err());
    }
}
