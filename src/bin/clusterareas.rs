use areacluster::{
    AreaClusterResult, AreaDatabase, BoundingBox, ClusterList, ClusterRenderer, Coord, KmlFile,
    KmzFile, Viewport,
};
use clap::Parser;
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
};

/*-------------------------------------------------------------------------------------------------
 *                                     Command Line Options
 *-----------------------------------------------------------------------------------------------*/

///
/// Export the clustered area markers for a view of the map.
///
/// This program fetches the active, geocoded areas in a bounding box, groups them the way the map
/// would at the given zoom level, and saves the markers as KML or KMZ.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "clusterareas")]
#[clap(author, version, about)]
struct ClusterAreasOptionsInit {
    /// The path to the areas database file.
    ///
    /// If this is not specified, then the program will check for it in the "AREAS_DB"
    /// environment variable.
    #[clap(short, long)]
    #[clap(env = "AREAS_DB")]
    areas_store_file: PathBuf,

    /// The path to a KML or KMZ file to produce from this run.
    ///
    /// If this is not specified, then the program will create one automatically by replacing the
    /// file extension on the areas_store_file with "*.kml". A "*.kmz" extension produces a zipped
    /// file.
    #[clap(short, long)]
    output_file: Option<PathBuf>,

    /// The map zoom level.
    #[clap(short, long)]
    #[clap(default_value_t = 14)]
    zoom: i32,

    /// Bounding Box where as bottom_lat,left_lon,top_lat,right_lon
    #[clap(short, long)]
    #[clap(default_value_t=BoundingBox{ll:Coord{lat: -23.1, lon: -43.8}, ur:Coord{lat: -22.75, lon: -43.1}})]
    bbox: BoundingBox,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Debug)]
struct ClusterAreasOptionsChecked {
    /// The path to the database file.
    areas_store_file: PathBuf,

    /// The path to the file to produce from this run.
    output_file: PathBuf,

    /// The map zoom level.
    zoom: i32,

    /// Bounding Box
    bbox: BoundingBox,

    /// Verbose output
    verbose: bool,
}

impl Display for ClusterAreasOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "\n")?; // yes, two blank lines.
        writeln!(f, "    Database: {}", self.areas_store_file.display())?;
        writeln!(f, "      Output: {}", self.output_file.display())?;
        writeln!(f, "        Zoom: {}", self.zoom)?;
        writeln!(
            f,
            "Bounding Box: ({:.6}, {:.6}) <---> ({:.6}, {:.6})",
            self.bbox.ll.lat, self.bbox.ll.lon, self.bbox.ur.lat, self.bbox.ur.lon
        )?;
        writeln!(f, "\n")?; // yes, two blank lines.

        Ok(())
    }
}

/// Get the command line arguments and check them.
///
/// If there is missing data, try to fill it in with environment variables.
fn parse_args() -> AreaClusterResult<ClusterAreasOptionsChecked> {
    let ClusterAreasOptionsInit {
        areas_store_file,
        output_file,
        zoom,
        bbox,
        verbose,
    } = ClusterAreasOptionsInit::parse();

    let output_file = match output_file {
        Some(v) => v,
        None => {
            let mut clone = areas_store_file.clone();
            clone.set_extension("kml");
            clone
        }
    };

    if output_file == areas_store_file {
        return Err("Output file would overwrite the database".into());
    }

    Ok(ClusterAreasOptionsChecked {
        areas_store_file,
        output_file,
        zoom,
        bbox,
        verbose,
    })
}

fn is_kmz(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("kmz"))
        .unwrap_or(false)
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

    //
    // Load the areas in view.
    //
    let db = AreaDatabase::connect(&opts.areas_store_file)?;
    if let Some(updated) = db.last_updated() {
        info!("Areas last updated {}", updated);
    }

    let view = Viewport::new(opts.bbox, opts.zoom);
    let areas = db.query_viewport(&view)?;
    drop(db);

    info!("Retrieved {} areas (limit {}).", areas.len(), view.limit());

    //
    // Group them and write them out.
    //
    let clusters = ClusterList::from_area_points(&areas, opts.zoom);

    info!(
        "{} clusters, {} areas excluded, {} total vagas.",
        clusters.len(),
        clusters.excluded,
        clusters.total_capacity()
    );

    if is_kmz(&opts.output_file) {
        let mut kmz = KmzFile::new(&opts.output_file)?;
        kmz.render(&clusters)?;
    } else {
        let mut kml = KmlFile::new(&opts.output_file)?;
        kml.render(&clusters)?;
    }

    info!("Saved {}", opts.output_file.display());

    Ok(())
}
