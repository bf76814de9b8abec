use super::Cluster;
use crate::area::{AreaId, PopupDetails};
use std::fmt::{self, Display};

/// Only this many codes are listed for a multi-area marker.
const MAX_POPUP_CODES: usize = 10;

/// What to show when a marker is opened.
#[derive(Debug)]
pub enum Popup<'a, D> {
    /// A lone area, with its own details.
    Single {
        id: &'a AreaId,
        code: Option<&'a str>,
        capacity: u32,
        details: &'a D,
    },
    /// A summary of a group of areas.
    Group {
        count: usize,
        total_capacity: u64,
        codes: Vec<&'a str>,
    },
}

/// Build the popup for a cluster.
pub fn popup_content<'a, D>(cluster: &Cluster<'a, D>) -> Popup<'a, D> {
    if cluster.is_cluster() {
        Popup::Group {
            count: cluster.len(),
            total_capacity: cluster.total_capacity(),
            codes: cluster.areas().filter_map(|a| a.code.as_deref()).collect(),
        }
    } else {
        let area = cluster.seed();
        Popup::Single {
            id: &area.id,
            code: area.code.as_deref(),
            capacity: area.capacity(),
            details: &area.details,
        }
    }
}

struct Details<'d, D>(&'d D);

impl<'d, D: PopupDetails> Display for Details<'d, D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.write_details(f)
    }
}

impl<'a, D: PopupDetails> Display for Popup<'a, D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            Popup::Single {
                id,
                code,
                capacity,
                details,
            } => {
                match code {
                    Some(code) => write!(f, "Area {}<br/>", code)?,
                    None => write!(f, "Area {}<br/>", id)?,
                }
                write!(f, "Vagas: {}", capacity)?;

                let details = Details(*details).to_string();
                if !details.is_empty() {
                    write!(f, "<br/>{}", details)?;
                }
            }
            Popup::Group {
                count,
                total_capacity,
                codes,
            } => {
                write!(f, "{} areas<br/>", count)?;
                write!(f, "Total vagas: {}", total_capacity)?;

                if !codes.is_empty() {
                    write!(f, "<br/>Codes: ")?;
                    for (i, code) in codes.iter().take(MAX_POPUP_CODES).enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", code)?;
                    }

                    if codes.len() > MAX_POPUP_CODES {
                        write!(f, ", ... ({} more)", codes.len() - MAX_POPUP_CODES)?;
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::area::{Address, AreaPoint};

    #[test]
    fn test_single_popup() {
        let points = vec![AreaPoint::<()>::new(4, -22.9, -43.1, Some(12))
            .with_code("CEN-04")
            .with_details(Address {
                street: Some("Av. Rio Branco".to_owned()),
                number: Some("1".to_owned()),
                ..Address::default()
            })];

        let clusters = Cluster::from_area_points(&points, 15);
        let popup = popup_content(&clusters[0]);

        match &popup {
            Popup::Single { capacity, code, .. } => {
                assert_eq!(*capacity, 12);
                assert_eq!(*code, Some("CEN-04"));
            }
            Popup::Group { .. } => panic!("expected a single area"),
        }

        assert_eq!(
            popup.to_string(),
            "Area CEN-04<br/>Vagas: 12<br/>Av. Rio Branco 1"
        );
    }

    #[test]
    fn test_single_popup_without_code_or_details() {
        let points: Vec<AreaPoint> = vec![AreaPoint::new("x9", -22.9, -43.1, None)];
        let clusters = Cluster::from_area_points(&points, 15);

        assert_eq!(
            popup_content(&clusters[0]).to_string(),
            "Area x9<br/>Vagas: 0"
        );
    }

    #[test]
    fn test_group_popup() {
        let points: Vec<AreaPoint> = (0..12)
            .map(|i| {
                let area = AreaPoint::new(i, -22.9, -43.1, Some(2));
                if i % 2 == 0 {
                    area.with_code(format!("C{}", i))
                } else {
                    area
                }
            })
            .collect();

        let clusters = Cluster::from_area_points(&points, 15);
        assert_eq!(clusters.len(), 1);

        let popup = popup_content(&clusters[0]);
        match &popup {
            Popup::Group {
                count,
                total_capacity,
                codes,
            } => {
                assert_eq!(*count, 12);
                assert_eq!(*total_capacity, 24);
                assert_eq!(codes.len(), 6);
            }
            Popup::Single { .. } => panic!("expected a group"),
        }

        assert_eq!(
            popup.to_string(),
            "12 areas<br/>Total vagas: 24<br/>Codes: C0, C2, C4, C6, C8, C10"
        );
    }
}
