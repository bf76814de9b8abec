/*!
 * Group parking area markers so they don't pile on top of each other on a map.
 *
 * Areas come from a viewport query ([AreaDatabase::query_viewport]) as [AreaPoint] snapshots.
 * They are grouped for a zoom level with [cluster] or [ClusterList::from_area_points], and the
 * result can be drawn with anything implementing [ClusterRenderer], such as a [KmlFile] or
 * [KmzFile].
 */

pub use area::{Address, AreaId, AreaPoint, CoordValue, PopupDetails};
pub use cluster::{
    cluster, cluster_color, cluster_distance, cluster_scale, popup_content, Cluster, ClusterColor,
    ClusterList, ClusterMember, Popup, CLUSTER_CLICK_ZOOM_STEP, MAX_CLUSTER_SCALE,
};
pub use database::{AreaDatabase, AreaDatabaseAddArea, AreaRecord};
pub use error::{AreaClusterError, AreaClusterResult};
pub use geo::{great_circle_distance, haversine_distance_m, BoundingBox, Coord};
pub use kml::{ClusterRenderer, KmlFile, KmlWriter, KmzFile};
pub use proximity::{nearest, sort_by_proximity, Nearby};
pub use viewport::{max_areas_for_zoom, Viewport};

/**************************************************************************************************
 * Private Implementation
 *************************************************************************************************/
mod area;
mod cluster;
mod database;
mod error;
mod geo;
mod kml;
mod proximity;
mod viewport;
