use areacluster::{
    Address, AreaClusterError, AreaClusterResult, AreaDatabase, AreaPoint, BoundingBox,
    ClusterList, ClusterRenderer, Coord, KmzFile, Viewport,
};
use clap::Parser;
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, info, LevelFilter};
use simple_logger::SimpleLogger;
use std::{
    fmt::{self, Display},
    ops::RangeInclusive,
    path::PathBuf,
    thread::{self, Scope, ScopedJoinHandle},
};

const CHANNEL_SIZE: usize = 16;

/// Zoom levels a map can actually be set to.
const MAP_ZOOMS: RangeInclusive<i32> = 0..=30;

/*-------------------------------------------------------------------------------------------------
 *                                     Command Line Options
 *-----------------------------------------------------------------------------------------------*/

///
/// Export the clustered area markers for a range of zoom levels.
///
/// All the areas in the bounding box are fetched once, then each zoom level is clustered on its
/// own thread. The result is a single KMZ file with a folder for each zoom level.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "clusterzooms")]
#[clap(author, version, about)]
struct ClusterZoomsOptionsInit {
    /// The path to the areas database file.
    ///
    /// If this is not specified, then the program will check for it in the "AREAS_DB"
    /// environment variable.
    #[clap(short, long)]
    #[clap(env = "AREAS_DB")]
    areas_store_file: PathBuf,

    /// The path to a KMZ file to produce from this run.
    ///
    /// If this is not specified, then the program will create one automatically by replacing the
    /// file extension on the areas_store_file with "*.kmz".
    #[clap(short, long)]
    kmz_file: Option<PathBuf>,

    /// The lowest zoom level to export.
    #[clap(long)]
    #[clap(default_value_t = 8)]
    min_zoom: i32,

    /// The highest zoom level to export.
    #[clap(long)]
    #[clap(default_value_t = 18)]
    max_zoom: i32,

    /// Bounding Box where as bottom_lat,left_lon,top_lat,right_lon
    #[clap(short, long)]
    #[clap(default_value_t=BoundingBox{ll:Coord{lat: -23.1, lon: -43.8}, ur:Coord{lat: -22.75, lon: -43.1}})]
    bbox: BoundingBox,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Debug)]
struct ClusterZoomsOptionsChecked {
    /// The path to the database file.
    areas_store_file: PathBuf,

    /// The path to the KMZ file to produce from this run.
    kmz_file: PathBuf,

    /// The lowest zoom level.
    min_zoom: i32,

    /// The highest zoom level.
    max_zoom: i32,

    /// The number of zoom levels from min_zoom to max_zoom.
    num_zooms: usize,

    /// Bounding Box
    bbox: BoundingBox,

    /// Verbose output
    verbose: bool,
}

impl Display for ClusterZoomsOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "\n")?; // yes, two blank lines.
        writeln!(f, "    Database: {}", self.areas_store_file.display())?;
        writeln!(f, "  Output KMZ: {}", self.kmz_file.display())?;
        writeln!(f, " Zoom levels: {} - {}", self.min_zoom, self.max_zoom)?;
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
fn parse_args() -> AreaClusterResult<ClusterZoomsOptionsChecked> {
    let ClusterZoomsOptionsInit {
        areas_store_file,
        kmz_file,
        min_zoom,
        max_zoom,
        bbox,
        verbose,
    } = ClusterZoomsOptionsInit::parse();

    let num_zooms = zoom_count(min_zoom, max_zoom)?;

    let kmz_file = match kmz_file {
        Some(v) => v,
        None => {
            let mut clone = areas_store_file.clone();
            clone.set_extension("kmz");
            clone
        }
    };

    Ok(ClusterZoomsOptionsChecked {
        areas_store_file,
        kmz_file,
        min_zoom,
        max_zoom,
        num_zooms,
        bbox,
        verbose,
    })
}

/// Check the zoom range and get the number of zoom levels in it.
fn zoom_count(min_zoom: i32, max_zoom: i32) -> AreaClusterResult<usize> {
    for zoom in [min_zoom, max_zoom] {
        if !MAP_ZOOMS.contains(&zoom) {
            return Err(format!(
                "zoom levels must be between {} and {}: {}",
                MAP_ZOOMS.start(),
                MAP_ZOOMS.end(),
                zoom
            )
            .into());
        }
    }

    if min_zoom > max_zoom {
        return Err(format!(
            "min_zoom must not be larger than max_zoom: {} > {}",
            min_zoom, max_zoom
        )
        .into());
    }

    Ok(usize::try_from(i64::from(max_zoom) - i64::from(min_zoom) + 1)?)
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

    // The largest zoom has the largest fetch limit.
    let db = AreaDatabase::connect(&opts.areas_store_file)?;
    let areas = db.query_viewport(&Viewport::new(opts.bbox, opts.max_zoom))?;
    drop(db);

    info!("Retrieved {} areas.", areas.len());

    let num_workers = num_cpus::get().min(opts.num_zooms).max(1);

    let mut lists = cluster_zooms(&areas, opts.min_zoom, opts.max_zoom, num_workers)?;

    lists.sort_unstable_by_key(|list| list.zoom);

    let mut kmz = KmzFile::new(&opts.kmz_file)?;
    for list in &lists {
        info!(
            "zoom {:>2} - {:>6} m - {:>5} clusters - {:>5} excluded",
            list.zoom,
            list.threshold_m,
            list.len(),
            list.excluded
        );
        kmz.render(list)?;
    }

    info!("Saved {}", opts.kmz_file.display());

    Ok(())
}

/// Cluster the areas for every zoom level in the range, spread over `num_workers` threads.
fn cluster_zooms(
    areas: &[AreaPoint<Address>],
    min_zoom: i32,
    max_zoom: i32,
    num_workers: usize,
) -> AreaClusterResult<Vec<ClusterList<'_, Address>>> {
    thread::scope(|s| {
        let (to_workers, from_zoom_gen) = bounded(CHANNEL_SIZE);
        let (to_collector, from_workers) = bounded(CHANNEL_SIZE);

        let zoom_gen = start_zoom_generation_thread(s, min_zoom, max_zoom, to_workers)?;
        let workers = start_cluster_threads(s, areas, num_workers, from_zoom_gen, to_collector)?;

        let lists: Vec<_> = from_workers.into_iter().collect();

        zoom_gen.join().map_err(|_| AreaClusterError {
            msg: "zoom generation thread panicked",
        })??;

        for jh in workers {
            jh.join().map_err(|_| AreaClusterError {
                msg: "cluster thread panicked",
            })?;
        }

        Ok(lists)
    })
}

fn start_zoom_generation_thread<'scope>(
    s: &'scope Scope<'scope, '_>,
    min_zoom: i32,
    max_zoom: i32,
    to_workers: Sender<i32>,
) -> AreaClusterResult<ScopedJoinHandle<'scope, AreaClusterResult<()>>> {
    let jh = thread::Builder::new()
        .name("zoom-gen".to_owned())
        .spawn_scoped(s, move || -> AreaClusterResult<()> {
            for zoom in min_zoom..=max_zoom {
                to_workers.send(zoom)?;
            }
            Ok(())
        })?;

    Ok(jh)
}

fn start_cluster_threads<'scope, 'env>(
    s: &'scope Scope<'scope, 'env>,
    areas: &'env [AreaPoint<Address>],
    num_workers: usize,
    from_zoom_gen: Receiver<i32>,
    to_collector: Sender<ClusterList<'env, Address>>,
) -> AreaClusterResult<Vec<ScopedJoinHandle<'scope, ()>>> {
    let mut handles = Vec::with_capacity(num_workers);

    for _ in 0..num_workers {
        let from_zoom_gen = from_zoom_gen.clone();
        let to_collector = to_collector.clone();

        let jh = thread::Builder::new()
            .name("cluster".to_owned())
            .spawn_scoped(s, move || {
                for zoom in from_zoom_gen {
                    let list = ClusterList::from_area_points(areas, zoom);
                    debug!(target: "cluster", "finished zoom {}", zoom);

                    if to_collector.send(list).is_err() {
                        break;
                    }
                }
            })?;

        handles.push(jh);
    }

    Ok(handles)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_zoom_count() {
        assert_eq!(zoom_count(8, 18).unwrap(), 11);
        assert_eq!(zoom_count(12, 12).unwrap(), 1);
        assert_eq!(zoom_count(0, 30).unwrap(), 31);

        assert!(zoom_count(18, 8).is_err());
        assert!(zoom_count(-1, 10).is_err());
        assert!(zoom_count(10, 31).is_err());
        assert!(zoom_count(i32::MIN, 0).is_err());
        assert!(zoom_count(0, i32::MAX).is_err());
    }
}
