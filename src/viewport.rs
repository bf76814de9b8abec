/*!
 * What to ask the area store for.
 *
 * Clustering is quadratic in the number of areas, so the number fetched for a view is capped. The
 * cap is smallest when zoomed far out, where a lot of areas would end up in a few markers anyway.
 */

use crate::geo::BoundingBox;

/// Fetch caps, each entry is the largest zoom level the cap applies to.
const ZOOM_LIMITS: [(i32, usize); 4] = [(8, 100), (10, 250), (12, 500), (14, 1_000)];

/// Cap for anything zoomed in past the end of the table.
const MAX_AREAS: usize = 2_000;

/// Get the maximum number of areas to fetch for a zoom level.
pub fn max_areas_for_zoom(zoom: i32) -> usize {
    ZOOM_LIMITS
        .iter()
        .find(|(max_zoom, _)| zoom <= *max_zoom)
        .map(|(_, limit)| *limit)
        .unwrap_or(MAX_AREAS)
}

/// The visible part of the map.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub bbox: BoundingBox,
    pub zoom: i32,
}

impl Viewport {
    pub fn new(bbox: BoundingBox, zoom: i32) -> Self {
        Viewport { bbox, zoom }
    }

    /// The maximum number of areas to fetch for this view.
    pub fn limit(&self) -> usize {
        max_areas_for_zoom(self.zoom)
    }
}
