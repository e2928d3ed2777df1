use geo::Point;
use serde_json::Value;

/// Number of micro-degrees per degree. Coordinates are quantized to this
/// precision when used as grouping keys.
const MICRO_DEG: f64 = 1_000_000.0;

/// A geographically located resource (collection container, vehicle, storage
/// site) as returned by the paginated provider. Immutable once fetched.
#[derive(Debug, Clone)]
pub struct Resource {
    pub id: String,
    pub category: String,
    pub position: Point<f64>,
    /// Provider-specific fields the core does not interpret.
    pub metadata: Value,
}

impl Resource {
    pub fn location_key(&self) -> LocationKey {
        LocationKey::from_point(&self.position)
    }
}

/// One page of a paginated collection.
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<Resource>,
    pub total: u64,
    pub offset: u64,
    pub limit: u32,
}

/// A coordinate quantized to micro-degrees. Two resources with the same key
/// are considered co-located; coordinates are used exactly as received, so
/// this is an exact-equality key, not a fuzzy merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationKey {
    pub lon_micro: i64,
    pub lat_micro: i64,
}

impl LocationKey {
    pub fn from_point(point: &Point<f64>) -> Self {
        LocationKey {
            lon_micro: (point.x() * MICRO_DEG).round() as i64,
            lat_micro: (point.y() * MICRO_DEG).round() as i64,
        }
    }

    pub fn to_point(self) -> Point<f64> {
        Point::new(
            self.lon_micro as f64 / MICRO_DEG,
            self.lat_micro as f64 / MICRO_DEG,
        )
    }
}

/// One or more resources sharing a location. Members keep arrival order.
#[derive(Debug, Clone)]
pub struct MarkerGroup {
    pub key: LocationKey,
    pub members: Vec<Resource>,
}

impl MarkerGroup {
    /// The coordinate the group is drawn at: its first member's position.
    pub fn position(&self) -> Point<f64> {
        self.members[0].position
    }

    /// Distinct member categories in first-seen order, for info windows.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for member in &self.members {
            if !seen.contains(&member.category.as_str()) {
                seen.push(&member.category);
            }
        }
        seen
    }
}

/// Screen-space position in pixels, origin at the viewport's top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn distance(&self, other: &ScreenPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// The visible map area a render pass is computed for.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    /// Longitude/latitude at the viewport center.
    pub center: Point<f64>,
    pub zoom: u8,
    pub width_px: f64,
    pub height_px: f64,
}

/// How a cluster should be drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterStyle {
    /// Two or more resources: a circular badge labeled with the count.
    Badge { count: u64 },
    /// A single resource: its category icon, with a selected variant.
    Icon { category: String, selected: bool },
}

/// A renderable grouping of marker groups within a pixel-distance tolerance.
/// Built fresh on every render pass; never persisted.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub anchor: ScreenPoint,
    pub groups: Vec<LocationKey>,
    /// Total resources across the member groups, not the group count.
    pub size: u64,
    pub style: ClusterStyle,
}

/// Observable fetch state exposed by a filter-synced store.
#[derive(Debug, Clone)]
pub struct FetchState<T> {
    pub loading: bool,
    pub data: T,
}
