use crate::{
    area::{AreaId, AreaPoint},
    geo::{haversine_distance_m, Coord},
};
use rustc_hash::FxHashSet;

/// Number of zoom levels to move in when a multi-area marker is clicked.
pub const CLUSTER_CLICK_ZOOM_STEP: i32 = 2;

/// An area that made it into a cluster along with its parsed location.
#[derive(Debug)]
pub struct ClusterMember<'a, D> {
    pub area: &'a AreaPoint<D>,
    pub coord: Coord,
}

impl<'a, D> Clone for ClusterMember<'a, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, D> Copy for ClusterMember<'a, D> {}

impl<'a, D> ClusterMember<'a, D> {
    /// Wrap an area, if it has a usable location.
    pub(crate) fn new(area: &'a AreaPoint<D>) -> Option<Self> {
        area.coord().map(|coord| ClusterMember { area, coord })
    }
}

/**
 * A group of areas drawn as a single marker.
 *
 * Clusters only live for one pass of the clustering, the id is built from the first area in it
 * and will not be the same after the map moves.
 */
#[derive(Debug)]
pub struct Cluster<'a, D> {
    /// Looks like "cluster_<id of the seed area>".
    id: String,
    /// Location of the seed for a single area, otherwise the average location of the members.
    centroid: Coord,
    /// The areas in the order they were given, seed first.
    members: Vec<ClusterMember<'a, D>>,
    /// Sum of the vagas of all the members.
    total_capacity: u64,
}

impl<'a, D> Cluster<'a, D> {
    /**
     * Group AreaPoint objects into clusters.
     *
     * The areas are visited in order. The first area not yet in a cluster becomes the seed of a
     * new cluster, and every later area that is not yet in a cluster and is within
     * [cluster_distance](crate::cluster_distance) of the seed joins it. Membership only depends on
     * the distance to the seed, not to the other members. Reordering the input can change the
     * result.
     *
     * Areas with missing or unparseable coordinates are skipped. An area with the same id as one
     * already placed in a cluster is skipped too.
     *
     * #Arguments
     * points - the areas in the current viewport.
     * zoom - the map zoom level.
     *
     * #Returns
     * A list of clusters that together hold every area with a valid location exactly once.
     */
    pub fn from_area_points(points: &'a [AreaPoint<D>], zoom: i32) -> Vec<Self> {
        let valid: Vec<_> = points.iter().filter_map(ClusterMember::new).collect();
        Self::group(&valid, crate::cluster_distance(zoom))
    }

    /// The greedy, seed relative grouping. All bookkeeping is local to this call.
    pub(crate) fn group(valid: &[ClusterMember<'a, D>], threshold_m: f64) -> Vec<Self> {
        let mut clusters: Vec<Self> = vec![];
        let mut processed: FxHashSet<&AreaId> = FxHashSet::default();

        for (i, seed) in valid.iter().enumerate() {
            if !processed.insert(&seed.area.id) {
                log::debug!("skipping repeated area id {}", seed.area.id);
                continue;
            }

            let mut members = vec![*seed];

            // Everything before the seed is already in a cluster.
            for candidate in &valid[(i + 1)..] {
                if processed.contains(&candidate.area.id) {
                    continue;
                }

                let distance = haversine_distance_m(
                    seed.coord.lat,
                    seed.coord.lon,
                    candidate.coord.lat,
                    candidate.coord.lon,
                );

                if distance <= threshold_m {
                    processed.insert(&candidate.area.id);
                    members.push(*candidate);
                }
            }

            clusters.push(Self::from_members(members));
        }

        clusters
    }

    fn from_members(members: Vec<ClusterMember<'a, D>>) -> Self {
        debug_assert!(!members.is_empty());

        let seed = members[0];
        let id = format!("cluster_{}", seed.area.id);

        let total_capacity = members
            .iter()
            .map(|member| u64::from(member.area.capacity()))
            .sum();

        let centroid = if members.len() == 1 {
            seed.coord
        } else {
            let count = members.len() as f64;
            let (lat_sum, lon_sum) = members.iter().fold((0.0, 0.0), |(lat, lon), member| {
                (lat + member.coord.lat, lon + member.coord.lon)
            });

            Coord {
                lat: lat_sum / count,
                lon: lon_sum / count,
            }
        };

        Cluster {
            id,
            centroid,
            members,
            total_capacity,
        }
    }

    /// Get the id of this cluster, only unique within a single pass.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the location to draw the marker at.
    pub fn centroid(&self) -> Coord {
        self.centroid
    }

    /// Get the areas in this cluster, the seed is first.
    pub fn members(&self) -> &[ClusterMember<'a, D>] {
        &self.members
    }

    /// Iterate over the areas in this cluster.
    pub fn areas(&self) -> impl Iterator<Item = &'a AreaPoint<D>> + '_ {
        self.members.iter().map(|member| member.area)
    }

    /// Get the area that started this cluster.
    pub fn seed(&self) -> &'a AreaPoint<D> {
        self.members[0].area
    }

    /// The number of areas in the cluster.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false, a cluster has at least one area.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// True if more than one area was merged into this cluster.
    pub fn is_cluster(&self) -> bool {
        self.members.len() > 1
    }

    /// Get the total number of vagas in the cluster.
    pub fn total_capacity(&self) -> u64 {
        self.total_capacity
    }

    /// Short text for the marker, the member count or the code of a lone area.
    pub fn label(&self) -> String {
        if self.is_cluster() {
            self.len().to_string()
        } else {
            let seed = self.seed();
            match &seed.code {
                Some(code) => code.clone(),
                None => seed.id.to_string(),
            }
        }
    }

    /// The zoom level to move to when this marker is clicked.
    ///
    /// Clicking a single area leaves the zoom alone, and a click never zooms out, even when the
    /// map is already past `max_zoom`.
    pub fn expansion_zoom(&self, current_zoom: i32, max_zoom: i32) -> i32 {
        if self.is_cluster() {
            let zoom_in = current_zoom.saturating_add(CLUSTER_CLICK_ZOOM_STEP).min(max_zoom);
            current_zoom.max(zoom_in)
        } else {
            current_zoom
        }
    }
}
