use super::{cluster::ClusterMember, Cluster};
use crate::area::AreaPoint;
use chrono::{DateTime, Utc};

/**
 * Keep a list of clusters with metadata about the pass that produced it.
 *
 * Every time the map moves or zooms a new list is made, nothing in here is meant to survive
 * between passes.
 */
#[derive(Debug)]
pub struct ClusterList<'a, D> {
    /// The zoom level the clusters were made for.
    pub zoom: i32,
    /// The merge distance used, meters.
    pub threshold_m: f64,
    /// When the clustering was done.
    pub generated: DateTime<Utc>,
    /// Number of areas left out because they had no usable location.
    pub excluded: usize,
    /// The clusters.
    pub clusters: Vec<Cluster<'a, D>>,
}

impl<'a, D> ClusterList<'a, D> {
    /**
     * Cluster a snapshot of areas and keep track of what was left out.
     *
     * #Arguments
     * points - the areas returned by the viewport query.
     * zoom - the map zoom level.
     */
    pub fn from_area_points(points: &'a [AreaPoint<D>], zoom: i32) -> Self {
        let threshold_m = crate::cluster_distance(zoom);

        let mut excluded = 0;
        let mut valid = Vec::with_capacity(points.len());
        for area in points {
            match ClusterMember::new(area) {
                Some(member) => valid.push(member),
                None => {
                    log::debug!(
                        "excluding area {} with bad coordinates: {:?}, {:?}",
                        area.id,
                        area.lat,
                        area.lon
                    );
                    excluded += 1;
                }
            }
        }

        let clusters = Cluster::group(&valid, threshold_m);

        log::debug!(
            "zoom {} ({} m): {} areas -> {} clusters, {} excluded",
            zoom,
            threshold_m,
            points.len(),
            clusters.len(),
            excluded
        );

        ClusterList {
            zoom,
            threshold_m,
            generated: Utc::now(),
            excluded,
            clusters,
        }
    }

    /// The number of clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// True if no area had a usable location.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// The number of areas placed in a cluster.
    pub fn total_areas(&self) -> usize {
        self.clusters.iter().map(Cluster::len).sum()
    }

    /// Total vagas over all the clusters.
    pub fn total_capacity(&self) -> u64 {
        self.clusters.iter().map(Cluster::total_capacity).sum()
    }

    /// Get an iterator over the clusters.
    pub fn iter(&self) -> impl Iterator<Item = &Cluster<'a, D>> {
        self.clusters.iter()
    }
}
