/*!
 * Types and functions for grouping areas into map markers.
 *
 * A cluster is a group of one or more [AreaPoint] objects that are drawn as a single marker
 * because at the current zoom level they would overlap on the screen. The distance used to merge
 * areas shrinks as the map is zoomed in, see [cluster_distance].
 */

pub use self::cluster::{Cluster, ClusterMember, CLUSTER_CLICK_ZOOM_STEP};
pub use cluster_list::ClusterList;
pub use popup::{popup_content, Popup};
pub use style::{cluster_color, cluster_scale, ClusterColor, MAX_CLUSTER_SCALE};

use crate::area::AreaPoint;

mod cluster;
mod cluster_list;
mod popup;
mod style;

/// Merge distance for each zoom level, meters.
///
/// Each entry is the largest zoom level the distance applies to. Entries must be sorted by zoom
/// and the distances must never increase.
const ZOOM_THRESHOLDS: [(i32, f64); 11] = [
    (5, 50_000.0),
    (7, 20_000.0),
    (8, 10_000.0),
    (9, 5_000.0),
    (10, 2_000.0),
    (11, 1_000.0),
    (12, 500.0),
    (13, 200.0),
    (14, 100.0),
    (15, 50.0),
    (17, 25.0),
];

/// Merge distance for anything zoomed in past the end of the table, meters.
const MIN_CLUSTER_DISTANCE_M: f64 = 10.0;

/**
 * Get the distance in meters below which two areas are merged at a zoom level.
 *
 * Zoom levels outside of the usual 3-20 range are not an error, they get the first or last value
 * in the table.
 */
pub fn cluster_distance(zoom: i32) -> f64 {
    ZOOM_THRESHOLDS
        .iter()
        .find(|(max_zoom, _)| zoom <= *max_zoom)
        .map(|(_, distance)| *distance)
        .unwrap_or(MIN_CLUSTER_DISTANCE_M)
}

/**
 * Group areas into clusters for display at the given zoom level.
 *
 * Areas without a usable latitude and longitude are left out. See [Cluster::from_area_points].
 */
pub fn cluster<D>(points: &[AreaPoint<D>], zoom: i32) -> Vec<Cluster<'_, D>> {
    Cluster::from_area_points(points, zoom)
}

static_assertions::assert_impl_all!(Cluster<'static, crate::area::Address>: Send, Sync);
static_assertions::assert_impl_all!(ClusterList<'static, crate::area::Address>: Send, Sync);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cluster_distance_is_monotonic() {
        let mut prev = cluster_distance(-100);
        for zoom in -100..=100 {
            let dist = cluster_distance(zoom);
            assert!(dist > 0.0, "zoom {} -> {}", zoom, dist);
            assert!(dist <= prev, "zoom {} -> {} > {}", zoom, dist, prev);
            prev = dist;
        }

        assert!(cluster_distance(i32::MIN) > 0.0);
        assert!(cluster_distance(i32::MAX) > 0.0);
    }

    #[test]
    fn test_cluster_distance_table() {
        assert_eq!(cluster_distance(3), 50_000.0);
        assert_eq!(cluster_distance(6), 20_000.0);
        assert_eq!(cluster_distance(12), 500.0);
        assert_eq!(cluster_distance(15), 50.0);
        assert_eq!(cluster_distance(16), 25.0);
        assert_eq!(cluster_distance(18), 10.0);
        assert_eq!(cluster_distance(22), 10.0);

        for pair in ZOOM_THRESHOLDS.windows(2) {
            assert!(pair[0].0 < pair[1].0);
            assert!(pair[0].1 >= pair[1].1);
        }
    }
}
