/*!
 * The points that get clustered.
 *
 * An [AreaPoint] is a read-only snapshot of a parking area as it came back from a viewport query.
 * Coordinates are kept the way they arrived, which may be text, and are only turned into numbers
 * when something needs them.
 */

use crate::geo::Coord;
use std::fmt::{self, Display};

/// The identity of an area.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AreaId {
    Int(i64),
    Text(String),
}

impl Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            AreaId::Int(id) => write!(f, "{}", id),
            AreaId::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for AreaId {
    fn from(id: i64) -> Self {
        AreaId::Int(id)
    }
}

impl From<i32> for AreaId {
    fn from(id: i32) -> Self {
        AreaId::Int(i64::from(id))
    }
}

impl From<&str> for AreaId {
    /// Strings that hold an integer become [AreaId::Int] so "7" and 7 are the same area.
    fn from(id: &str) -> Self {
        match id.trim().parse::<i64>() {
            Ok(val) => AreaId::Int(val),
            Err(_) => AreaId::Text(id.to_owned()),
        }
    }
}

impl From<String> for AreaId {
    fn from(id: String) -> Self {
        match id.trim().parse::<i64>() {
            Ok(val) => AreaId::Int(val),
            Err(_) => AreaId::Text(id),
        }
    }
}

/// A latitude or longitude as it was delivered by the data source.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordValue {
    Number(f64),
    Text(String),
    Missing,
}

impl CoordValue {
    /// Get the value in degrees, if it is a finite number.
    ///
    /// Text must be a complete number after trimming white space, "12abc" is rejected.
    pub fn parse(&self) -> Option<f64> {
        let val = match self {
            CoordValue::Number(val) => *val,
            CoordValue::Text(txt) => txt.trim().parse::<f64>().ok()?,
            CoordValue::Missing => return None,
        };

        if val.is_finite() {
            Some(val)
        } else {
            None
        }
    }

    /// Text form suitable for storage. [CoordValue::Missing] has none.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CoordValue::Number(val) => Some(val.to_string()),
            CoordValue::Text(txt) => Some(txt.clone()),
            CoordValue::Missing => None,
        }
    }
}

impl From<f64> for CoordValue {
    fn from(val: f64) -> Self {
        CoordValue::Number(val)
    }
}

impl From<&str> for CoordValue {
    fn from(val: &str) -> Self {
        CoordValue::Text(val.to_owned())
    }
}

impl From<String> for CoordValue {
    fn from(val: String) -> Self {
        CoordValue::Text(val)
    }
}

impl<T: Into<CoordValue>> From<Option<T>> for CoordValue {
    fn from(val: Option<T>) -> Self {
        val.map(Into::into).unwrap_or(CoordValue::Missing)
    }
}

/// A parking area to place on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaPoint<D = ()> {
    pub id: AreaId,
    pub lat: CoordValue,
    pub lon: CoordValue,
    /// Number of parking spots (vagas). `None` counts as zero.
    pub vagas: Option<u32>,
    /// Short code shown on markers.
    pub code: Option<String>,
    /// Display only data carried through to popups, never looked at by the clustering.
    pub details: D,
}

impl<D: Default> AreaPoint<D> {
    /// Create an area with no code and default details.
    pub fn new<I, C>(id: I, lat: C, lon: C, vagas: Option<u32>) -> Self
    where
        I: Into<AreaId>,
        C: Into<CoordValue>,
    {
        AreaPoint {
            id: id.into(),
            lat: lat.into(),
            lon: lon.into(),
            vagas,
            code: None,
            details: D::default(),
        }
    }
}

impl<D> AreaPoint<D> {
    /// Get the location if both the latitude and longitude are usable.
    pub fn coord(&self) -> Option<Coord> {
        let lat = self.lat.parse()?;
        let lon = self.lon.parse()?;
        Some(Coord { lat, lon })
    }

    /// The capacity with a missing value treated as zero.
    pub fn capacity(&self) -> u32 {
        self.vagas.unwrap_or(0)
    }

    /// Set the short code.
    pub fn with_code<S: Into<String>>(mut self, code: S) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Replace the details payload.
    pub fn with_details<E>(self, details: E) -> AreaPoint<E> {
        AreaPoint {
            id: self.id,
            lat: self.lat,
            lon: self.lon,
            vagas: self.vagas,
            code: self.code,
            details,
        }
    }
}

/// Anything carried in [AreaPoint::details] that wants to show up in a popup.
pub trait PopupDetails {
    /// Write the text for a popup, the default writes nothing.
    fn write_details(&self, _f: &mut fmt::Formatter) -> fmt::Result {
        Ok(())
    }
}

impl PopupDetails for () {}

impl PopupDetails for String {
    fn write_details(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Street address of an area, as stored in the areas database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub street: Option<String>,
    pub number: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let street = self.street.as_ref().map(|street| match &self.number {
            Some(number) => format!("{} {}", street, number),
            None => street.clone(),
        });

        let parts = [
            street.as_deref(),
            self.neighborhood.as_deref(),
            self.city.as_deref(),
            self.state.as_deref(),
        ];

        for (i, part) in parts.into_iter().flatten().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", part)?;
        }

        Ok(())
    }
}

impl PopupDetails for Address {
    fn write_details(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_coord_value_parse() {
        assert_eq!(CoordValue::Number(-22.9068).parse(), Some(-22.9068));
        assert_eq!(CoordValue::from(" -43.1729 ").parse(), Some(-43.1729));
        assert_eq!(CoordValue::from("abc").parse(), None);
        assert_eq!(CoordValue::from("12abc").parse(), None);
        assert_eq!(CoordValue::from("").parse(), None);
        assert_eq!(CoordValue::from("NaN").parse(), None);
        assert_eq!(CoordValue::from("inf").parse(), None);
        assert_eq!(CoordValue::Number(f64::NAN).parse(), None);
        assert_eq!(CoordValue::Missing.parse(), None);
        assert_eq!(CoordValue::from(None::<f64>), CoordValue::Missing);
    }

    #[test]
    fn test_area_id_from_text() {
        assert_eq!(AreaId::from("17"), AreaId::Int(17));
        assert_eq!(AreaId::from("A-17"), AreaId::Text("A-17".to_owned()));
        assert_eq!(AreaId::from(17).to_string(), "17");
    }

    #[test]
    fn test_area_point_coord_and_capacity() {
        let good: AreaPoint = AreaPoint::new(1, "-22.9", "-43.1", None);
        assert_eq!(
            good.coord(),
            Some(Coord {
                lat: -22.9,
                lon: -43.1
            })
        );
        assert_eq!(good.capacity(), 0);

        let bad: AreaPoint = AreaPoint::new(2, "-22.9", "x", Some(4));
        assert_eq!(bad.coord(), None);
        assert_eq!(bad.capacity(), 4);
    }

    #[test]
    fn test_address_display() {
        let addr = Address {
            street: Some("Rua do Ouvidor".to_owned()),
            number: Some("50".to_owned()),
            neighborhood: Some("Centro".to_owned()),
            city: Some("Rio de Janeiro".to_owned()),
            state: None,
        };
        assert_eq!(addr.to_string(), "Rua do Ouvidor 50, Centro, Rio de Janeiro");

        let addr = Address {
            city: Some("Niteroi".to_owned()),
            ..Address::default()
        };
        assert_eq!(addr.to_string(), "Niteroi");
        assert_eq!(Address::default().to_string(), "");
    }
}
