/*!
 * Sort areas by how far they are from a location.
 *
 * This is not clustering. It answers "which areas are closest to me" and reports distances in
 * kilometers using [great_circle_distance].
 */

use crate::{
    area::AreaPoint,
    geo::{great_circle_distance, Coord},
};

/// An area and its distance from the point of interest.
#[derive(Debug)]
pub struct Nearby<'a, D> {
    pub area: &'a AreaPoint<D>,
    pub distance_km: f64,
}

/**
 * Order the areas from nearest to farthest from `origin`.
 *
 * Areas without a usable location are left out. Areas at the same distance keep their input
 * order.
 */
pub fn sort_by_proximity<D>(points: &[AreaPoint<D>], origin: Coord) -> Vec<Nearby<'_, D>> {
    let mut nearby: Vec<_> = points
        .iter()
        .filter_map(|area| {
            area.coord().map(|coord| Nearby {
                area,
                distance_km: great_circle_distance(origin.lat, origin.lon, coord.lat, coord.lon),
            })
        })
        .collect();

    nearby.sort_by(|left, right| left.distance_km.total_cmp(&right.distance_km));

    nearby
}

/// Get the `n` areas nearest to `origin`.
pub fn nearest<D>(points: &[AreaPoint<D>], origin: Coord, n: usize) -> Vec<Nearby<'_, D>> {
    let mut nearby = sort_by_proximity(points, origin);
    nearby.truncate(n);
    nearby
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::area::AreaId;

    fn ids<D>(nearby: &[Nearby<'_, D>]) -> Vec<AreaId> {
        nearby.iter().map(|n| n.area.id.clone()).collect()
    }

    #[test]
    fn test_sort_by_proximity() {
        let points: Vec<AreaPoint> = vec![
            AreaPoint::new(1, "-22.95", "-43.20", None),
            AreaPoint::new(2, "bad", "-43.20", None),
            AreaPoint::new(3, "-22.91", "-43.17", None),
            AreaPoint::new(4, "-23.50", "-46.60", None),
            AreaPoint::new(5, "-22.95", "-43.20", None),
        ];

        let origin = Coord {
            lat: -22.9068,
            lon: -43.1729,
        };

        let sorted = sort_by_proximity(&points, origin);
        assert_eq!(
            ids(&sorted),
            vec![AreaId::Int(3), AreaId::Int(1), AreaId::Int(5), AreaId::Int(4)]
        );

        assert!(sorted[0].distance_km < 1.0);
        assert!((sorted[3].distance_km - 357.0).abs() < 10.0);

        let two = nearest(&points, origin, 2);
        assert_eq!(ids(&two), vec![AreaId::Int(3), AreaId::Int(1)]);

        assert!(nearest(&points, origin, 0).is_empty());
        assert_eq!(nearest(&points, origin, 100).len(), 4);
    }
}
