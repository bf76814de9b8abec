/*!
 * Geographic calculations.
 *
 * Two different distance functions live here. The clustering code works in meters with the
 * haversine formula, while the proximity sort reports kilometers. They use a different radius and
 * a different form of the same formula, so they are not interchangeable.
 */

use crate::{AreaClusterError, AreaClusterResult};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

/// Mean radius of the Earth used for clustering, meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Mean radius of the Earth used for the proximity sort, kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    /// Check if two coordinates are within `eps` degrees of each other in both directions.
    pub fn is_close(&self, other: Coord, eps: f64) -> bool {
        (self.lat - other.lat).abs() < eps && (self.lon - other.lon).abs() < eps
    }
}

/// A latitude-longitude aligned box, usually the visible part of the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Lower left (south west) corner.
    pub ll: Coord,
    /// Upper right (north east) corner.
    pub ur: Coord,
}

impl BoundingBox {
    /// Check if a coordinate lies in the box. Points on the edges are inside.
    pub fn contains(&self, coord: Coord) -> bool {
        coord.lat >= self.ll.lat
            && coord.lat <= self.ur.lat
            && coord.lon >= self.ll.lon
            && coord.lon <= self.ur.lon
    }
}

impl Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(
            f,
            "{},{},{},{}",
            self.ll.lat, self.ll.lon, self.ur.lat, self.ur.lon
        )
    }
}

impl FromStr for BoundingBox {
    type Err = Box<dyn std::error::Error + Send + Sync>;

    /// Parse a box given as bottom_lat,left_lon,top_lat,right_lon
    fn from_str(bbox_str: &str) -> AreaClusterResult<Self> {
        let corners: Vec<_> = bbox_str.split(',').map(str::trim).collect();

        if corners.len() != 4 {
            return Err(Box::new(AreaClusterError {
                msg: "bounding box needs exactly 4 values",
            }));
        }

        let min_lat: f64 = corners[0].parse()?;
        let min_lon: f64 = corners[1].parse()?;
        let max_lat: f64 = corners[2].parse()?;
        let max_lon: f64 = corners[3].parse()?;

        if min_lat >= max_lat || min_lon >= max_lon {
            return Err(format!(
                concat!(
                    "Minimum Lat/Lon must be less than Maximum Lat/Lon:",
                    " min_lat={} max_lat={} min_lon={} max_lon={}"
                ),
                min_lat, max_lat, min_lon, max_lon
            )
            .into());
        }

        if min_lat < -90.0 || max_lat > 90.0 || min_lon < -180.0 || max_lon > 180.0 {
            return Err(format!(
                concat!(
                    "Lat/Lon are out of range (-90.0 to 90.0 and -180.0 to 180.0):",
                    " min_lat={} max_lat={} min_lon={} max_lon={}"
                ),
                min_lat, max_lat, min_lon, max_lon
            )
            .into());
        }

        Ok(BoundingBox {
            ll: Coord {
                lat: min_lat,
                lon: min_lon,
            },
            ur: Coord {
                lat: max_lat,
                lon: max_lon,
            },
        })
    }
}

/**
 * The haversine distance used to decide if two areas belong in the same cluster.
 *
 * #Arguments
 * * lat1 - the latitude of the first point in degrees.
 * * lon1 - the longitude of the first point in degrees.
 * * lat2 - the latitude of the second point in degrees.
 * * lon2 - the longitude of the second point in degrees.
 *
 * #Returns
 * The distance between the points in meters.
 */
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let sin_dlat = f64::sin(dlat / 2.0);
    let sin_dlon = f64::sin(dlon / 2.0);

    let a = sin_dlat * sin_dlat
        + f64::cos(lat1.to_radians()) * f64::cos(lat2.to_radians()) * sin_dlon * sin_dlon;

    2.0 * EARTH_RADIUS_M * f64::atan2(a.sqrt(), (1.0 - a).sqrt())
}

/**
 * The simple great circle distance calculation.
 *
 * #Arguments
 * * lat1 - the latitude of the first point in degrees.
 * * lon1 - the longitude of the first point in degrees.
 * * lat2 - the latitude of the second point in degrees.
 * * lon2 - the longitude of the second point in degrees.
 *
 * #Returns
 * The distance between the points in kilometers.
 */
pub fn great_circle_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const DEG2RAD: f64 = 2.0 * std::f64::consts::PI / 360.0;

    let lat1_r = lat1 * DEG2RAD;
    let lon1_r = lon1 * DEG2RAD;
    let lat2_r = lat2 * DEG2RAD;
    let lon2_r = lon2 * DEG2RAD;

    let dlat2 = (lat2_r - lat1_r) / 2.0;
    let dlon2 = (lon2_r - lon1_r) / 2.0;

    let sin2_dlat = f64::powf(f64::sin(dlat2), 2.0);
    let sin2_dlon = f64::powf(f64::sin(dlon2), 2.0);

    let arc = 2.0
        * f64::asin(f64::sqrt(
            sin2_dlat + sin2_dlon * f64::cos(lat1_r) * f64::cos(lat2_r),
        ));

    arc * EARTH_RADIUS_KM
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_haversine_known_distances() {
        assert_eq!(haversine_distance_m(-22.9, -43.2, -22.9, -43.2), 0.0);

        // One degree of latitude along a meridian.
        let one_deg = haversine_distance_m(0.0, 0.0, 1.0, 0.0);
        assert!((one_deg - 111_194.9).abs() < 1.0, "{}", one_deg);

        let near = haversine_distance_m(-22.9068, -43.1729, -22.9070, -43.1730);
        assert!(near > 20.0 && near < 30.0, "{}", near);

        let far = haversine_distance_m(-22.9068, -43.1729, -22.9500, -43.2000);
        assert!(far > 5_000.0 && far < 6_000.0, "{}", far);
    }

    #[test]
    fn test_distances_agree_across_units() {
        let m = haversine_distance_m(52.5200, 13.4050, 48.8566, 2.3522);
        let km = great_circle_distance(52.5200, 13.4050, 48.8566, 2.3522);

        assert!((m / 1000.0 - km).abs() < 0.01);
        assert!((km - 878.0).abs() < 10.0);
    }

    #[test]
    fn test_bounding_box_contains() {
        let bbox = BoundingBox {
            ll: Coord {
                lat: -23.0,
                lon: -43.5,
            },
            ur: Coord {
                lat: -22.5,
                lon: -43.0,
            },
        };

        assert!(bbox.contains(Coord {
            lat: -22.9,
            lon: -43.2
        }));
        assert!(bbox.contains(bbox.ll));
        assert!(bbox.contains(bbox.ur));
        assert!(!bbox.contains(Coord {
            lat: -22.4,
            lon: -43.2
        }));
    }

    #[test]
    fn test_bounding_box_parse() {
        let bbox: BoundingBox = "-23.0, -43.5, -22.5, -43.0".parse().unwrap();
        assert!(bbox.ll.is_close(
            Coord {
                lat: -23.0,
                lon: -43.5
            },
            1.0e-12
        ));
        assert!(bbox.ur.is_close(
            Coord {
                lat: -22.5,
                lon: -43.0
            },
            1.0e-12
        ));

        assert!("-23.0,-43.5,-22.5".parse::<BoundingBox>().is_err());
        assert!("-22.5,-43.5,-23.0,-43.0".parse::<BoundingBox>().is_err());
        assert!("-91.0,-43.5,-22.5,-43.0".parse::<BoundingBox>().is_err());
        assert!("a,b,c,d".parse::<BoundingBox>().is_err());
    }
}
