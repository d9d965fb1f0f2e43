use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use landsat_archive::aoi::Aoi;
use landsat_archive::catalog::{self, SyncOutcome};
use landsat_archive::download_plan::DownloadPlan;
use landsat_archive::selection::{self, Selection};
use landsat_archive::sensors;
use landsat_archive::transfer::TransferOptions;
use landsat_archive::{Catalog, Product, SearchQuery, Settings, Store};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "landsat")]
#[command(version, about = "Search and download Landsat Collection 1 products")]
struct Cli {
    /// Settings file (defaults to LANDSAT_CONFIG or <data dir>/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download one or more products
    Download {
        /// Product identifiers
        products: Vec<String>,
        /// Output directory
        #[arg(short = 'd', long, alias = "output-dir", default_value = ".")]
        output: PathBuf,
        /// Comma-separated file labels, e.g. B4.TIF,B5.TIF,MTL.txt
        #[arg(short, long)]
        files: Option<String>,
        /// TOML selection of products and files
        #[arg(long)]
        selection: Option<PathBuf>,
        /// Write the download plan as JSON before running it
        #[arg(long)]
        write_plan: Option<PathBuf>,
        /// Skip MD5 verification
        #[arg(long)]
        no_verify: bool,
        /// Hide progress bars
        #[arg(short, long)]
        quiet: bool,
    },
    /// Search the local catalog index
    #[command(allow_negative_numbers = true)]
    Search {
        /// Begin date (YYYY or YYYY-MM-DD)
        #[arg(short, long)]
        begin: String,
        /// End date (YYYY or YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        end: Option<String>,
        /// Area of interest as a GeoJSON file
        #[arg(short, long)]
        geojson: Option<PathBuf>,
        /// Point of interest
        #[arg(short, long, num_args = 2, value_names = ["LAT", "LON"])]
        latlon: Option<Vec<f64>>,
        /// WRS-2 path, repeatable
        #[arg(short, long)]
        path: Vec<u32>,
        /// WRS-2 row, repeatable
        #[arg(short, long)]
        row: Vec<u32>,
        /// Maximum cloud cover in percent
        #[arg(short, long)]
        clouds: Option<f64>,
        /// Comma-separated sensors
        #[arg(short, long)]
        sensors: Option<String>,
        /// Comma-separated tiers
        #[arg(short, long)]
        tiers: Option<String>,
        /// Include Landsat 7 scenes acquired after the SLC failure
        #[arg(long)]
        slcoff: bool,
        /// Write results to a CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Download the catalog index
    SyncDatabase {
        /// Replace an existing index
        #[arg(short, long)]
        force: bool,
    },
    /// Print the data directory
    #[command(name = "print-datadir", alias = "print-data-dir")]
    PrintDatadir,
    /// List supported sensors
    ListSensors,
    /// List the files published for a sensor
    ListAvailableFiles { sensor: String },
    /// Write a selection template to use with `download --selection`
    NewSelection { path: PathBuf },
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

async fn download(
    store: &Store,
    mut products: Vec<String>,
    output: &Path,
    files: Option<&str>,
    selection: Option<&Path>,
    write_plan: Option<&Path>,
    options: TransferOptions,
) -> Result<()> {
    let mut files = split_list(files);
    if let Some(path) = selection {
        let selection = Selection::read(path)?;
        products.extend(selection.ids_to_download());
        if files.is_empty() {
            files = selection.files_to_download();
        }
    }
    if products.is_empty() {
        bail!("No product to download");
    }

    let products = products
        .iter()
        .map(|id| Product::new(id.trim()))
        .collect::<Result<Vec<_>>>()?;

    if let Some(plan_path) = write_plan {
        let mut plan = DownloadPlan::default();
        for product in &products {
            plan.extend(product.plan(output, &files)?);
        }
        plan.write(plan_path)?;
        log::info!("Download plan written to {}", plan_path.display());
    }

    for product in &products {
        log::info!("Downloading {}", product.product_id());
        let dir = product.download(store, output, &files, options).await?;
        log::info!("{} downloaded to {}", product.product_id(), dir.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Download {
            products,
            output,
            files,
            selection,
            write_plan,
            no_verify,
            quiet,
        } => {
            let store = Store::from_settings(&settings.storage).await?;
            let options = TransferOptions {
                progress: !quiet,
                verify: !no_verify,
            };
            download(
                &store,
                products,
                &output,
                files.as_deref(),
                selection.as_deref(),
                write_plan.as_deref(),
                options,
            )
            .await?;
        }
        Commands::Search {
            begin,
            end,
            geojson,
            latlon,
            path,
            row,
            clouds,
            sensors,
            tiers,
            slcoff,
            output,
        } => {
            let end = end.unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());
            let mut builder = SearchQuery::builder()
                .begin(&begin)
                .end(&end)
                .sensors(&split_list(sensors.as_deref()))
                .tiers(&split_list(tiers.as_deref()))
                .include_slc_off(slcoff);
            for p in path {
                builder = builder.path(p);
            }
            for r in row {
                builder = builder.row(r);
            }
            if let Some(max_cloud) = clouds {
                builder = builder.max_cloud(max_cloud);
            }
            if let Some(file) = geojson {
                builder = builder.aoi(Aoi::from_geojson_file(file)?);
            } else if let Some(coords) = latlon {
                builder = builder.aoi(Aoi::from_lat_lon(coords[0], coords[1])?);
            }
            let query = builder.build()?;

            let catalog = Catalog::from_settings(&settings);
            let store = Store::from_settings(&settings.storage).await?;
            catalog.ensure(&store, true).await?;

            let scenes = catalog.search(&query)?;
            match output {
                Some(csv_path) => {
                    catalog::write_csv(&scenes, &csv_path)?;
                    log::info!("Results written to {}", csv_path.display());
                }
                None => {
                    for scene in &scenes {
                        println!("{}", scene.product_id);
                    }
                }
            }
        }
        Commands::SyncDatabase { force } => {
            let catalog = Catalog::from_settings(&settings);
            let store = Store::from_settings(&settings.storage).await?;
            if catalog.sync(&store, force, true).await? == SyncOutcome::AlreadyPresent {
                log::info!("Use --force to download it again");
            }
        }
        Commands::PrintDatadir => println!("{}", settings.data_dir.display()),
        Commands::ListSensors => {
            for sensor in sensors::supported_sensors() {
                println!("{sensor}");
            }
        }
        Commands::ListAvailableFiles { sensor } => {
            for label in sensors::available_files(&sensor)? {
                println!("{label}");
            }
        }
        Commands::NewSelection { path } => {
            if path.exists() {
                bail!("{} already exists", path.display());
            }
            Selection::from_template(&selection::template())?.write(&path)?;
            log::info!("Selection template written to {}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_output_dir() {
        for flag in ["--output", "--output-dir", "-d"] {
            let cli = Cli::try_parse_from([
                "landsat",
                "download",
                "LC08_L1TP_193027_20200712_20200722_01_T1",
                flag,
                "/tmp/scenes",
            ])
            .unwrap();
            let Commands::Download { output, products, .. } = cli.command else {
                panic!("expected download");
            };
            assert_eq!(output, PathBuf::from("/tmp/scenes"));
            assert_eq!(products.len(), 1);
        }
    }

    #[test]
    fn test_search_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "landsat", "search", "-b", "2019", "-l", "-16.0", "-179.5", "-p", "44", "-p", "45",
        ])
        .unwrap();
        let Commands::Search { latlon, path, .. } = cli.command else {
            panic!("expected search");
        };
        assert_eq!(latlon, Some(vec![-16.0, -179.5]));
        assert_eq!(path, vec![44, 45]);
    }
}
