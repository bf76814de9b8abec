use areacluster::{
    Address, AreaClusterResult, AreaDatabase, AreaId, AreaPoint, AreaRecord, CoordValue,
};
use clap::Parser;
use log::{debug, info, warn, LevelFilter};
use simple_logger::SimpleLogger;
use std::{
    fmt::{self, Display},
    path::PathBuf,
};

/*-------------------------------------------------------------------------------------------------
 *                                     Command Line Options
 *-----------------------------------------------------------------------------------------------*/

///
/// Load parking areas from a CSV file into the areas database.
///
/// The CSV file must have a header row. Columns are found by name: id, code, lat, lon, vagas,
/// active, geocoded, street, number, neighborhood, city, and state. Only id is required. Rows
/// that already exist in the database are replaced.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "importareas")]
#[clap(author, version, about)]
struct ImportAreasOptionsInit {
    /// The CSV file to import.
    csv_file: PathBuf,

    /// The path to the areas database file.
    ///
    /// If this is not specified, then the program will check for it in the "AREAS_DB"
    /// environment variable.
    #[clap(short, long)]
    #[clap(env = "AREAS_DB")]
    areas_store_file: PathBuf,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Debug)]
struct ImportAreasOptionsChecked {
    /// The CSV file to import.
    csv_file: PathBuf,

    /// The path to the database file.
    areas_store_file: PathBuf,

    /// Verbose output
    verbose: bool,
}

impl Display for ImportAreasOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "\n")?; // yes, two blank lines.
        writeln!(f, "   CSV: {}", self.csv_file.display())?;
        writeln!(f, "    DB: {}", self.areas_store_file.display())?;
        writeln!(f, "\n")?; // yes, two blank lines.

        Ok(())
    }
}

fn parse_args() -> AreaClusterResult<ImportAreasOptionsChecked> {
    let ImportAreasOptionsInit {
        csv_file,
        areas_store_file,
        verbose,
    } = ImportAreasOptionsInit::parse();

    if !csv_file.is_file() {
        return Err(format!("CSV file does not exist: {}", csv_file.display()).into());
    }

    Ok(ImportAreasOptionsChecked {
        csv_file,
        areas_store_file,
        verbose,
    })
}

/*-------------------------------------------------------------------------------------------------
 *                                        CSV Columns
 *-----------------------------------------------------------------------------------------------*/

/// Where each known column sits in a row, if it is present at all.
#[derive(Debug, Default)]
struct Columns {
    id: Option<usize>,
    code: Option<usize>,
    lat: Option<usize>,
    lon: Option<usize>,
    vagas: Option<usize>,
    active: Option<usize>,
    geocoded: Option<usize>,
    street: Option<usize>,
    number: Option<usize>,
    neighborhood: Option<usize>,
    city: Option<usize>,
    state: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> AreaClusterResult<Self> {
        let mut cols = Columns::default();

        for (i, name) in headers.iter().enumerate() {
            let slot = match name.trim().to_ascii_lowercase().as_str() {
                "id" | "area_id" => &mut cols.id,
                "code" => &mut cols.code,
                "lat" | "latitude" => &mut cols.lat,
                "lon" | "lng" | "longitude" => &mut cols.lon,
                "vagas" => &mut cols.vagas,
                "active" => &mut cols.active,
                "geocoded" => &mut cols.geocoded,
                "street" => &mut cols.street,
                "number" => &mut cols.number,
                "neighborhood" => &mut cols.neighborhood,
                "city" => &mut cols.city,
                "state" => &mut cols.state,
                other => {
                    debug!("Ignoring column {}", other);
                    continue;
                }
            };

            *slot = Some(i);
        }

        if cols.id.is_none() {
            return Err("CSV file has no id column".into());
        }

        Ok(cols)
    }
}

fn field(row: &csv::StringRecord, col: Option<usize>) -> Option<&str> {
    col.and_then(|i| row.get(i))
        .map(str::trim)
        .filter(|val| !val.is_empty())
}

fn owned_field(row: &csv::StringRecord, col: Option<usize>) -> Option<String> {
    field(row, col).map(str::to_owned)
}

fn parse_flag(val: &str) -> Option<bool> {
    match val.to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "sim" | "s" => Some(true),
        "0" | "false" | "f" | "no" | "n" | "nao" | "não" => Some(false),
        _ => None,
    }
}

fn row_to_record(row: &csv::StringRecord, cols: &Columns, line: u64) -> Option<AreaRecord> {
    let id = match field(row, cols.id) {
        Some(id) => AreaId::from(id),
        None => {
            warn!("Skipping line {}, it has no id.", line);
            return None;
        }
    };

    let vagas = field(row, cols.vagas).and_then(|val| match val.parse::<u32>() {
        Ok(vagas) => Some(vagas),
        Err(_) => {
            warn!("Area {} has an invalid vagas value: {}", id, val);
            None
        }
    });

    let lat = CoordValue::from(owned_field(row, cols.lat));
    let lon = CoordValue::from(owned_field(row, cols.lon));
    let has_location = lat.parse().is_some() && lon.parse().is_some();

    let active = field(row, cols.active).and_then(parse_flag).unwrap_or(true);
    let geocoded = field(row, cols.geocoded)
        .and_then(parse_flag)
        .unwrap_or(has_location);

    let details = Address {
        street: owned_field(row, cols.street),
        number: owned_field(row, cols.number),
        neighborhood: owned_field(row, cols.neighborhood),
        city: owned_field(row, cols.city),
        state: owned_field(row, cols.state),
    };

    let area = AreaPoint {
        id,
        lat,
        lon,
        vagas,
        code: owned_field(row, cols.code),
        details,
    };

    Some(AreaRecord {
        area,
        active,
        geocoded,
    })
}

/*-------------------------------------------------------------------------------------------------
 *                                             MAIN
 *-----------------------------------------------------------------------------------------------*/
fn main() -> AreaClusterResult<()> {
    let opts = parse_args()?;

    let level = if opts.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new().with_level(level).init()?;

    if opts.verbose {
        info!("{}", opts);
    }

    let mut rdr = csv::Reader::from_path(&opts.csv_file)?;
    let cols = Columns::from_headers(rdr.headers()?)?;

    let mut records = vec![];
    let mut skipped = 0;
    for (i, row) in rdr.records().enumerate() {
        // Line 1 is the header.
        let line = i as u64 + 2;

        let row = match row {
            Ok(row) => row,
            Err(err) => {
                warn!("Skipping line {}: {}", line, err);
                skipped += 1;
                continue;
            }
        };

        match row_to_record(&row, &cols, line) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    info!("Read {} areas, skipped {} rows.", records.len(), skipped);

    AreaDatabase::initialize(&opts.areas_store_file)?;
    let db = AreaDatabase::connect(&opts.areas_store_file)?;
    {
        let mut add = db.prepare_to_add_areas()?;
        add.add_all(&records)?;
    }

    info!(
        "{} now holds {} areas.",
        opts.areas_store_file.display(),
        db.count_areas()?
    );

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn headers() -> csv::StringRecord {
        csv::StringRecord::from(vec!["ID", "code", "lat", "lng", "vagas", "geocoded", "city"])
    }

    #[test]
    fn test_columns_by_name() {
        let cols = Columns::from_headers(&headers()).unwrap();
        assert_eq!(cols.id, Some(0));
        assert_eq!(cols.lon, Some(3));
        assert_eq!(cols.city, Some(6));
        assert_eq!(cols.active, None);

        let no_id = csv::StringRecord::from(vec!["code", "lat"]);
        assert!(Columns::from_headers(&no_id).is_err());
    }

    #[test]
    fn test_row_to_record() {
        let cols = Columns::from_headers(&headers()).unwrap();

        let row = csv::StringRecord::from(vec!["7", "A-7", "-22.9", "-43.1", "x", "", "Rio"]);
        let rec = row_to_record(&row, &cols, 2).unwrap();
        assert_eq!(rec.area.id, AreaId::Int(7));
        assert_eq!(rec.area.vagas, None);
        assert!(rec.active);
        assert!(rec.geocoded);
        assert_eq!(rec.area.details.city.as_deref(), Some("Rio"));

        let row = csv::StringRecord::from(vec!["8", "", "abc", "-43.1", "4", "", ""]);
        let rec = row_to_record(&row, &cols, 3).unwrap();
        assert!(!rec.geocoded);
        assert_eq!(rec.area.code, None);
        assert_eq!(rec.area.vagas, Some(4));

        let row = csv::StringRecord::from(vec!["9", "", "-22.9", "-43.1", "4", "nao", ""]);
        assert!(!row_to_record(&row, &cols, 4).unwrap().geocoded);

        let row = csv::StringRecord::from(vec![" ", "", "-22.9", "-43.1", "4", "", ""]);
        assert!(row_to_record(&row, &cols, 5).is_none());
    }
}
