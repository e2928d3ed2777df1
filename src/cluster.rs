//! Turns marker groups into renderable clusters for the current viewport:
//! Web Mercator projection into screen space, a greedy distance pass, and an
//! R-tree over the resulting anchors for pointer hit-testing.

use std::collections::HashSet;
use std::f64::consts::PI;

use geo::Point;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::types::{Cluster, ClusterStyle, LocationKey, MarkerGroup, ScreenPoint, Viewport};

const TILE_SIZE: f64 = 256.0;

/// Default pixel tolerance for absorbing groups into a cluster.
pub const DEFAULT_CLUSTER_DISTANCE: f64 = 50.0;

/// Default minimum separation between absorbed members. Stops a long chain of
/// nearby-but-not-mutually-close points from merging into one runaway cluster.
pub const DEFAULT_MIN_SEPARATION: f64 = 10.0;

/// Default pointer radius for hit-testing, in pixels.
pub const DEFAULT_HIT_RADIUS: f64 = 16.0;

/// Projects a coordinate into viewport-relative screen pixels (Web Mercator,
/// 256-pixel tiles; the viewport center lands at the screen center).
pub fn project(point: &Point<f64>, viewport: &Viewport) -> ScreenPoint {
    let (x, y) = world_px(point, viewport.zoom);
    let (center_x, center_y) = world_px(&viewport.center, viewport.zoom);
    ScreenPoint {
        x: x - center_x + viewport.width_px / 2.0,
        y: y - center_y + viewport.height_px / 2.0,
    }
}

fn world_px(point: &Point<f64>, zoom: u8) -> (f64, f64) {
    let n = 2.0_f64.powi(zoom as i32) * TILE_SIZE;
    let x = (point.x() + 180.0) / 360.0 * n;
    let lat_rad = point.y().to_radians();
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n;
    (x, y)
}

// R-tree entry for one computed cluster, indexed by its anchor.
struct AnchorEntry {
    cluster_index: usize,
    position: [f64; 2],
}

impl RTreeObject for AnchorEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for AnchorEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

struct RenderPass {
    clusters: Vec<Cluster>,
    anchors: RTree<AnchorEntry>,
}

/// Produces renderable clusters from a marker-group source.
///
/// Clusters are recomputed from scratch on every [`clusters_for`] call rather
/// than incrementally maintained; source sizes are in the low thousands, and
/// recomputing keeps the output correct under any viewport change.
///
/// [`clusters_for`]: ClusterRenderEngine::clusters_for
pub struct ClusterRenderEngine {
    source: Vec<MarkerGroup>,
    selected: HashSet<LocationKey>,
    min_separation: f64,
    hit_radius: f64,
    last_pass: Option<RenderPass>,
}

impl Default for ClusterRenderEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterRenderEngine {
    pub fn new() -> Self {
        ClusterRenderEngine {
            source: Vec::new(),
            selected: HashSet::new(),
            min_separation: DEFAULT_MIN_SEPARATION,
            hit_radius: DEFAULT_HIT_RADIUS,
            last_pass: None,
        }
    }

    pub fn with_min_separation(mut self, min_separation: f64) -> Self {
        self.min_separation = min_separation;
        self
    }

    pub fn with_hit_radius(mut self, hit_radius: f64) -> Self {
        self.hit_radius = hit_radius;
        self
    }

    /// Replaces the source groups. Selection state is kept (location keys are
    /// stable across refetches); the previous render pass is discarded.
    pub fn set_source(&mut self, groups: Vec<MarkerGroup>) {
        self.source = groups;
        self.last_pass = None;
    }

    /// Marks a group as selected or not. Takes effect on the next render pass.
    pub fn set_selected(&mut self, key: LocationKey, selected: bool) {
        if selected {
            self.selected.insert(key);
        } else {
            self.selected.remove(&key);
        }
    }

    pub fn is_selected(&self, key: LocationKey) -> bool {
        self.selected.contains(&key)
    }

    /// Computes the clusters to draw for `viewport` with the given pixel
    /// tolerance, replacing the previous render pass.
    ///
    /// Groups are processed in source order. Each unclustered group anchors a
    /// new cluster at its screen position and absorbs every later unclustered
    /// group within `pixel_distance` of the anchor that also keeps the
    /// minimum separation from everything absorbed so far.
    pub fn clusters_for(&mut self, viewport: &Viewport, pixel_distance: f64) -> &[Cluster] {
        let projected: Vec<ScreenPoint> = self
            .source
            .iter()
            .map(|group| project(&group.position(), viewport))
            .collect();

        let mut clustered = vec![false; self.source.len()];
        let mut clusters = Vec::new();

        for i in 0..self.source.len() {
            if clustered[i] {
                continue;
            }
            clustered[i] = true;

            let anchor = projected[i];
            let mut member_indexes = vec![i];

            for j in (i + 1)..self.source.len() {
                if clustered[j] {
                    continue;
                }
                if projected[j].distance(&anchor) > pixel_distance {
                    continue;
                }
                let keeps_separation = member_indexes
                    .iter()
                    .all(|&m| projected[j].distance(&projected[m]) >= self.min_separation);
                if keeps_separation {
                    clustered[j] = true;
                    member_indexes.push(j);
                }
            }

            clusters.push(self.build_cluster(anchor, &member_indexes));
        }

        let anchors = RTree::bulk_load(
            clusters
                .iter()
                .enumerate()
                .map(|(cluster_index, cluster)| AnchorEntry {
                    cluster_index,
                    position: [cluster.anchor.x, cluster.anchor.y],
                })
                .collect(),
        );

        let pass = self.last_pass.insert(RenderPass { clusters, anchors });
        &pass.clusters
    }

    fn build_cluster(&self, anchor: ScreenPoint, member_indexes: &[usize]) -> Cluster {
        let groups: Vec<LocationKey> = member_indexes.iter().map(|&m| self.source[m].key).collect();
        let size: u64 = member_indexes
            .iter()
            .map(|&m| self.source[m].members.len() as u64)
            .sum();

        // Badge for two or more resources, even when they sit at one location;
        // otherwise the single resource's category icon.
        let style = if size >= 2 {
            ClusterStyle::Badge { count: size }
        } else {
            let group = &self.source[member_indexes[0]];
            ClusterStyle::Icon {
                category: group.members[0].category.clone(),
                selected: self.selected.contains(&group.key),
            }
        };

        Cluster {
            anchor,
            groups,
            size,
            style,
        }
    }

    /// Finds the cluster of the latest render pass nearest to `point`, within
    /// the hit radius. Ties resolve to the smallest screen distance.
    pub fn hit_test(&self, point: ScreenPoint) -> Option<&Cluster> {
        let pass = self.last_pass.as_ref()?;
        let nearest = pass.anchors.nearest_neighbor(&[point.x, point.y])?;
        let cluster = &pass.clusters[nearest.cluster_index];
        if cluster.anchor.distance(&point) <= self.hit_radius {
            Some(cluster)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::types::Resource;

    // At zoom 8 near the equator one degree of longitude is ~182 px.
    const PX_PER_DEG: f64 = 256.0 * 256.0 / 360.0;

    fn viewport() -> Viewport {
        Viewport {
            center: Point::new(0.0, 0.0),
            zoom: 8,
            width_px: 1024.0,
            height_px: 768.0,
        }
    }

    fn group_at(lon: f64, lat: f64, ids: &[&str]) -> MarkerGroup {
        let members = ids
            .iter()
            .map(|id| Resource {
                id: id.to_string(),
                category: "general".to_string(),
                position: Point::new(lon, lat),
                metadata: Value::Null,
            })
            .collect::<Vec<_>>();
        MarkerGroup {
            key: members[0].location_key(),
            members,
        }
    }

    fn lon_at_px(px: f64) -> f64 {
        px / PX_PER_DEG
    }

    #[test]
    fn viewport_center_projects_to_screen_center() {
        let vp = viewport();
        let screen = project(&vp.center, &vp);
        assert!((screen.x - 512.0).abs() < 1e-9);
        assert!((screen.y - 384.0).abs() < 1e-9);
    }

    #[test]
    fn projection_moves_east_with_longitude() {
        let vp = viewport();
        let screen = project(&Point::new(1.0, 0.0), &vp);
        assert!((screen.x - (512.0 + PX_PER_DEG)).abs() < 1e-6);
        assert!((screen.y - 384.0).abs() < 1e-6);
    }

    #[test]
    fn groups_within_tolerance_merge_into_one_cluster() {
        let mut engine = ClusterRenderEngine::new();
        engine.set_source(vec![
            group_at(0.0, 0.0, &["a"]),
            group_at(lon_at_px(20.0), 0.0, &["b"]),
        ]);

        let clusters = engine.clusters_for(&viewport(), DEFAULT_CLUSTER_DISTANCE);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].size, 2);
        assert_eq!(clusters[0].style, ClusterStyle::Badge { count: 2 });
    }

    #[test]
    fn groups_beyond_tolerance_stay_apart() {
        let mut engine = ClusterRenderEngine::new();
        engine.set_source(vec![
            group_at(0.0, 0.0, &["a"]),
            group_at(1.0, 0.0, &["b"]),
        ]);

        let clusters = engine.clusters_for(&viewport(), DEFAULT_CLUSTER_DISTANCE);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn groups_closer_than_min_separation_are_not_absorbed() {
        let mut engine = ClusterRenderEngine::new();
        engine.set_source(vec![
            group_at(0.0, 0.0, &["a"]),
            group_at(lon_at_px(3.0), 0.0, &["b"]),
        ]);

        let clusters = engine.clusters_for(&viewport(), DEFAULT_CLUSTER_DISTANCE);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn cluster_is_anchored_at_its_first_group() {
        let vp = viewport();
        let mut engine = ClusterRenderEngine::new();
        engine.set_source(vec![
            group_at(0.0, 0.0, &["a"]),
            group_at(lon_at_px(20.0), 0.0, &["b"]),
        ]);

        let clusters = engine.clusters_for(&vp, DEFAULT_CLUSTER_DISTANCE);
        let expected = project(&Point::new(0.0, 0.0), &vp);
        assert_eq!(clusters[0].anchor, expected);
    }

    #[test]
    fn cluster_size_counts_resources_not_locations() {
        let mut engine = ClusterRenderEngine::new();
        engine.set_source(vec![
            group_at(0.0, 0.0, &["a", "b", "c"]),
            group_at(lon_at_px(20.0), 0.0, &["d"]),
        ]);

        let clusters = engine.clusters_for(&viewport(), DEFAULT_CLUSTER_DISTANCE);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].size, 4);
    }

    #[test]
    fn cluster_sizes_conserve_the_source_resource_count() {
        let mut engine = ClusterRenderEngine::new();
        let source = vec![
            group_at(0.0, 0.0, &["a", "b"]),
            group_at(lon_at_px(20.0), 0.0, &["c"]),
            group_at(lon_at_px(40.0), 0.0, &["d"]),
            group_at(2.0, 1.0, &["e", "f", "g"]),
            group_at(-3.0, -2.0, &["h"]),
        ];
        let expected: u64 = source.iter().map(|g| g.members.len() as u64).sum();
        engine.set_source(source);

        let clusters = engine.clusters_for(&viewport(), DEFAULT_CLUSTER_DISTANCE);
        let total: u64 = clusters.iter().map(|c| c.size).sum();
        assert_eq!(total, expected);
    }

    #[test]
    fn consecutive_passes_are_identical() {
        let mut engine = ClusterRenderEngine::new();
        engine.set_source(vec![
            group_at(0.0, 0.0, &["a"]),
            group_at(lon_at_px(20.0), 0.0, &["b"]),
            group_at(lon_at_px(40.0), 0.0, &["c"]),
            group_at(1.0, 1.0, &["d"]),
        ]);

        let first: Vec<Vec<LocationKey>> = engine
            .clusters_for(&viewport(), DEFAULT_CLUSTER_DISTANCE)
            .iter()
            .map(|c| c.groups.clone())
            .collect();
        let second: Vec<Vec<LocationKey>> = engine
            .clusters_for(&viewport(), DEFAULT_CLUSTER_DISTANCE)
            .iter()
            .map(|c| c.groups.clone())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn singleton_cluster_uses_icon_style_with_selection() {
        let mut engine = ClusterRenderEngine::new();
        let group = group_at(0.0, 0.0, &["a"]);
        let key = group.key;
        engine.set_source(vec![group]);

        let clusters = engine.clusters_for(&viewport(), DEFAULT_CLUSTER_DISTANCE);
        assert_eq!(
            clusters[0].style,
            ClusterStyle::Icon {
                category: "general".to_string(),
                selected: false,
            }
        );

        engine.set_selected(key, true);
        let clusters = engine.clusters_for(&viewport(), DEFAULT_CLUSTER_DISTANCE);
        assert_eq!(
            clusters[0].style,
            ClusterStyle::Icon {
                category: "general".to_string(),
                selected: true,
            }
        );
    }

    #[test]
    fn hit_test_finds_the_nearest_cluster_within_radius() {
        let vp = viewport();
        let mut engine = ClusterRenderEngine::new();
        engine.set_source(vec![
            group_at(0.0, 0.0, &["a"]),
            group_at(1.0, 0.0, &["b"]),
        ]);
        engine.clusters_for(&vp, DEFAULT_CLUSTER_DISTANCE);

        let anchor = project(&Point::new(0.0, 0.0), &vp);
        let near = ScreenPoint {
            x: anchor.x + 5.0,
            y: anchor.y - 5.0,
        };
        let hit = engine.hit_test(near).unwrap();
        assert_eq!(hit.groups[0], LocationKey::from_point(&Point::new(0.0, 0.0)));

        let far = ScreenPoint {
            x: anchor.x + 60.0,
            y: anchor.y,
        };
        assert!(engine.hit_test(far).is_none());
    }

    #[test]
    fn hit_test_before_any_pass_returns_none() {
        let engine = ClusterRenderEngine::new();
        assert!(engine
            .hit_test(ScreenPoint { x: 0.0, y: 0.0 })
            .is_none());
    }

    #[test]
    fn set_source_discards_the_previous_pass() {
        let vp = viewport();
        let mut engine = ClusterRenderEngine::new();
        engine.set_source(vec![group_at(0.0, 0.0, &["a"])]);
        engine.clusters_for(&vp, DEFAULT_CLUSTER_DISTANCE);

        engine.set_source(vec![group_at(1.0, 0.0, &["b"])]);
        let anchor = project(&Point::new(0.0, 0.0), &vp);
        assert!(engine.hit_test(anchor).is_none());
    }
}
