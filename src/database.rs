use crate::{
    area::{Address, AreaId, AreaPoint, CoordValue},
    viewport::Viewport,
    AreaClusterResult,
};
use chrono::{DateTime, Utc};
use log::warn;
use rusqlite::{params, Connection, OpenFlags, Row};
use std::path::Path;

/// Represents a connection to the database where the parking areas are stored.
pub struct AreaDatabase {
    conn: Connection,
}

impl AreaDatabase {
    /// Initialize a database.
    ///
    /// Initialize a database to make sure it exists and is set up properly. This should be run in
    /// the main thread before any other threads open a connection to the database to ensure
    /// consistency.
    pub fn initialize<P: AsRef<Path>>(path: P) -> AreaClusterResult<()> {
        let path = path.as_ref();

        let _conn = Self::open_database_to_write(path)?;
        Ok(())
    }

    /// Open a connection to the database.
    pub fn connect<P: AsRef<Path>>(path: P) -> AreaClusterResult<Self> {
        let path = path.as_ref();

        let conn = Self::open_database_to_write(path)?;
        Ok(AreaDatabase { conn })
    }

    fn open_database_to_write(path: &Path) -> AreaClusterResult<Connection> {
        let conn = rusqlite::Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        // A 5-second busy time out is WAY too much. If we hit this something has gone terribly wrong.
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        const QUERY: &str = include_str!("database/create_area_db.sql");
        conn.execute_batch(QUERY)?;

        Ok(conn)
    }

    /// Prepare to add areas to the database.
    pub fn prepare_to_add_areas(&self) -> AreaClusterResult<AreaDatabaseAddArea> {
        const ADD_AREA_QUERY: &str = include_str!("database/add_area.sql");

        let add_area_stmt = self.conn.prepare(ADD_AREA_QUERY)?;

        Ok(AreaDatabaseAddArea {
            add_area_stmt,
            conn: &self.conn,
        })
    }

    /// Count all the areas, active or not.
    pub fn count_areas(&self) -> AreaClusterResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM areas", [], |row| row.get(0))?;

        Ok(usize::try_from(count)?)
    }

    /// Get the last time anything in the database was added or changed.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.conn
            .query_row("SELECT MAX(updated) FROM areas", [], |row| {
                row.get::<_, Option<DateTime<Utc>>>(0)
            })
            .ok()
            .flatten()
    }

    /**
     * Get the areas to plot for a view of the map.
     *
     * Only active areas that were geocoded are returned, in the order they were added, and no
     * more than [Viewport::limit] of them. A row that cannot be read is logged and skipped, it
     * does not fail the query.
     */
    pub fn query_viewport(&self, view: &Viewport) -> AreaClusterResult<Vec<AreaPoint<Address>>> {
        const QUERY: &str = include_str!("database/query_viewport.sql");

        let limit = i64::try_from(view.limit())?;
        let mut stmt = self.conn.prepare(QUERY)?;

        let rows = stmt.query_and_then(
            params![
                view.bbox.ll.lat,
                view.bbox.ur.lat,
                view.bbox.ll.lon,
                view.bbox.ur.lon,
                limit
            ],
            query_row_to_area,
        )?;

        let mut areas = Vec::with_capacity(view.limit());
        for row in rows {
            match row {
                Ok(area) => areas.push(area),
                Err(err) => warn!("Error reading area from database: {}", err),
            }
        }

        Ok(areas)
    }
}

fn query_row_to_area(row: &Row) -> rusqlite::Result<AreaPoint<Address>> {
    let id: String = row.get(0)?;
    let code: Option<String> = row.get(1)?;
    let lat: Option<String> = row.get(2)?;
    let lon: Option<String> = row.get(3)?;
    let vagas: Option<u32> = row.get(4)?;

    let details = Address {
        street: row.get(5)?,
        number: row.get(6)?,
        neighborhood: row.get(7)?,
        city: row.get(8)?,
        state: row.get(9)?,
    };

    Ok(AreaPoint {
        id: AreaId::from(id),
        lat: CoordValue::from(lat),
        lon: CoordValue::from(lon),
        vagas,
        code,
        details,
    })
}

/// An area along with the flags the viewport query filters on.
#[derive(Debug, Clone)]
pub struct AreaRecord {
    pub area: AreaPoint<Address>,
    /// Inactive areas are never shown.
    pub active: bool,
    /// Only areas with a geocoded location are shown.
    pub geocoded: bool,
}

pub struct AreaDatabaseAddArea<'a> {
    add_area_stmt: rusqlite::Statement<'a>,
    conn: &'a Connection,
}

impl<'a> AreaDatabaseAddArea<'a> {
    /// Add or replace a single area.
    pub fn add(&mut self, record: &AreaRecord) -> AreaClusterResult<()> {
        let AreaRecord {
            area,
            active,
            geocoded,
        } = record;

        let Address {
            street,
            number,
            neighborhood,
            city,
            state,
        } = &area.details;

        self.add_area_stmt.execute(params![
            area.id.to_string(),
            area.code,
            area.lat.as_text(),
            area.lon.as_text(),
            area.vagas,
            active,
            geocoded,
            street,
            number,
            neighborhood,
            city,
            state,
            Utc::now(),
        ])?;

        Ok(())
    }

    /// Add a batch of areas in a single transaction.
    pub fn add_all(&mut self, records: &[AreaRecord]) -> AreaClusterResult<()> {
        self.conn.execute("BEGIN TRANSACTION", [])?;

        for record in records {
            if let Err(err) = self.add(record) {
                self.conn.execute("ROLLBACK", [])?;
                return Err(err);
            }
        }

        self.conn.execute("COMMIT", [])?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geo::{BoundingBox, Coord};

    fn record(id: i64, lat: &str, lon: &str, active: bool, geocoded: bool) -> AreaRecord {
        AreaRecord {
            area: AreaPoint::new(id, lat, lon, Some(2)),
            active,
            geocoded,
        }
    }

    #[test]
    fn test_viewport_query_filters() {
        let db = AreaDatabase {
            conn: Connection::open_in_memory().unwrap(),
        };
        db.conn
            .execute_batch(include_str!("database/create_area_db.sql"))
            .unwrap();

        {
            let mut add = db.prepare_to_add_areas().unwrap();
            add.add_all(&[
                record(1, "-22.90", "-43.17", true, true),
                record(2, "-22.91", "-43.18", false, true),
                record(3, "-22.92", "-43.19", true, false),
                record(4, "-23.50", "-46.60", true, true),
                record(5, "-22.93", "-43.20", true, true),
            ])
            .unwrap();
        }

        assert_eq!(db.count_areas().unwrap(), 5);
        assert!(db.last_updated().is_some());

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

        let areas = db.query_viewport(&Viewport::new(bbox, 15)).unwrap();
        let ids: Vec<_> = areas.iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, vec![AreaId::Int(1), AreaId::Int(5)]);
        assert_eq!(areas[0].lat, CoordValue::Text("-22.90".to_owned()));
        assert_eq!(areas[0].vagas, Some(2));
    }
}
