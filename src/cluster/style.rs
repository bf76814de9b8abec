//! How a cluster marker should look.

use strum::{EnumIter, IntoStaticStr};

/// Largest icon scale a marker will ever get.
pub const MAX_CLUSTER_SCALE: f64 = 3.0;

/// Color categories for markers, by the number of areas in them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
pub enum ClusterColor {
    /// A lone area.
    #[strum(serialize = "single")]
    Single,
    /// 2 to 9 areas.
    #[strum(serialize = "small")]
    Small,
    /// 10 to 49 areas.
    #[strum(serialize = "medium")]
    Medium,
    /// 50 or more areas.
    #[strum(serialize = "large")]
    Large,
}

impl ClusterColor {
    /// Get a name suitable for a style id.
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Get the color as an html style #rrggbb string.
    pub fn hex(&self) -> &'static str {
        use ClusterColor::*;

        match self {
            Single => "#1e88e5",
            Small => "#43a047",
            Medium => "#fb8c00",
            Large => "#e53935",
        }
    }

    /// Get the color in the KML aabbggrr format, fully opaque.
    pub fn kml_color(&self) -> &'static str {
        use ClusterColor::*;

        match self {
            Single => "ffe5881e",
            Small => "ff47a043",
            Medium => "ff008cfb",
            Large => "ff3539e5",
        }
    }
}

/// Pick the color category for a cluster with `size` areas.
///
/// Defined for every size, 0 is treated like a lone area.
pub fn cluster_color(size: usize) -> ClusterColor {
    match size {
        0 | 1 => ClusterColor::Single,
        2..=9 => ClusterColor::Small,
        10..=49 => ClusterColor::Medium,
        _ => ClusterColor::Large,
    }
}

/// Icon scale for a cluster with `size` areas drawn at `zoom`.
///
/// Grows with the log of the size and never goes past [MAX_CLUSTER_SCALE]. Markers are drawn a
/// little smaller when zoomed far out.
pub fn cluster_scale(size: usize, zoom: i32) -> f64 {
    let size = size.max(1) as f64;

    let zoom_factor = if zoom < 10 {
        0.8
    } else if zoom < 14 {
        0.9
    } else {
        1.0
    };

    let scale = (1.0 + 0.25 * size.ln()) * zoom_factor;
    scale.min(MAX_CLUSTER_SCALE)
}

#[cfg(test)]
mod test {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_cluster_color_buckets() {
        assert_eq!(cluster_color(0), ClusterColor::Single);
        assert_eq!(cluster_color(1), ClusterColor::Single);
        assert_eq!(cluster_color(2), ClusterColor::Small);
        assert_eq!(cluster_color(9), ClusterColor::Small);
        assert_eq!(cluster_color(10), ClusterColor::Medium);
        assert_eq!(cluster_color(49), ClusterColor::Medium);
        assert_eq!(cluster_color(50), ClusterColor::Large);
        assert_eq!(cluster_color(usize::MAX), ClusterColor::Large);
    }

    #[test]
    fn test_color_strings() {
        for color in ClusterColor::iter() {
            assert_eq!(color.hex().len(), 7);
            assert!(color.hex().starts_with('#'));
            assert_eq!(color.kml_color().len(), 8);

            // aabbggrr is rrggbb reversed by byte.
            let hex = &color.hex()[1..];
            let kml = color.kml_color();
            assert_eq!(&kml[0..2], "ff");
            assert_eq!(&kml[2..4], &hex[4..6]);
            assert_eq!(&kml[4..6], &hex[2..4]);
            assert_eq!(&kml[6..8], &hex[0..2]);
        }

        assert_eq!(ClusterColor::Medium.name(), "medium");
    }

    #[test]
    fn test_cluster_scale_grows_and_is_capped() {
        for zoom in [3, 10, 14, 20] {
            let mut prev = 0.0;
            for size in 1..10_000 {
                let scale = cluster_scale(size, zoom);
                assert!(scale >= prev);
                assert!(scale <= MAX_CLUSTER_SCALE);
                prev = scale;
            }
        }

        assert_eq!(cluster_scale(1, 15), 1.0);
        assert_eq!(cluster_scale(0, 15), 1.0);
        assert_eq!(cluster_scale(usize::MAX, 15), MAX_CLUSTER_SCALE);
        assert!(cluster_scale(20, 15) > cluster_scale(2, 15));
    }
}
