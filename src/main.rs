use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use snapmap::capture::{self, ExifLocator, FileCamera, FixedLocator, Locator, LocatorChain};
use snapmap::config::Config;
use snapmap::export::{export_records, ExportFormat};
use snapmap::library::{self, Library, LibraryEntry};
use snapmap::logging;
use snapmap::map::{self, MapScreen};
use snapmap::shell::Tab;
use snapmap::store::{Coordinates, PhotoStore};

struct Cli {
    config_path: Option<PathBuf>,
    command: String,
    args: Vec<String>,
}

fn parse_args() -> Cli {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = None;
    let mut command = None;
    let mut rest = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" if command.is_none() => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" if command.is_none() => {
                println!("snapmap {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
            }
            arg if command.is_none() => command = Some(arg.to_string()),
            arg => rest.push(arg.to_string()),
        }
        i += 1;
    }

    Cli {
        config_path,
        command: command.unwrap_or_else(|| "library".to_string()),
        args: rest,
    }
}

fn print_help() {
    println!(
        r#"snapmap - geotagged photo capture, library and map

USAGE:
    snapmap [OPTIONS] [COMMAND] [ARGS]

COMMANDS:
  Map
    map [--lat L --lon L]             Show located photos around a position
    share URI                         Print the share message for a photo
  Photo
    capture IMAGE [--lat L --lon L]   Record an image with location and time
    import DIR                        Capture every image under DIR
  Library
    library                           List all photos (default)
    watch                             Keep the library listing current
    clear                             Delete all photo records
    export FILE [--format F]          Write records as json, csv or geojson
  tabs                                Show the navigation tabs

OPTIONS:
    --config, -c PATH   Path to config file
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    SNAPMAP_CONFIG      Path to config file (overrides default location)
    SNAPMAP_LOG         Log level (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/snapmap/config.toml"#
    );
}

/// `--lat` / `--lon` pair from the command arguments, if both are present.
fn coordinates_arg(args: &[String]) -> Result<Option<Coordinates>> {
    let value = |flag: &str| -> Result<Option<f64>> {
        match args.iter().position(|a| a == flag) {
            Some(i) => {
                let raw = args
                    .get(i + 1)
                    .with_context(|| format!("{} requires a value", flag))?;
                let parsed = raw
                    .parse()
                    .with_context(|| format!("{} is not a number: {}", flag, raw))?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    };

    match (value("--lat")?, value("--lon")?) {
        (Some(lat), Some(lon)) => Ok(Some(Coordinates::new(lat, lon))),
        (None, None) => Ok(None),
        _ => bail!("--lat and --lon must be given together"),
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn positional(args: &[String], what: &str) -> Result<String> {
    args.first()
        .filter(|a| !a.starts_with("--"))
        .cloned()
        .with_context(|| format!("missing {}", what))
}

fn print_entries(entries: &[LibraryEntry]) {
    if entries.is_empty() {
        println!("No photos yet.");
        return;
    }
    for row in entries.chunks(library::GRID_COLUMNS) {
        let cells: Vec<String> = row
            .iter()
            .map(|e| format!("{:<40} {} | {}", e.image_uri, e.location_label, e.date_label))
            .collect();
        println!("{}", cells.join("    "));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_args();

    let config = match cli.config_path {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Err(e) = logging::init(&config.log) {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    if cli.command == "tabs" {
        for tab in Tab::ALL {
            println!("{:<8} {}", tab.title(), tab.commands().join(", "));
        }
        return Ok(());
    }

    if Tab::for_command(&cli.command).is_none() {
        eprintln!("Unknown command: {}", cli.command);
        print_help();
        std::process::exit(1);
    }

    let store = Arc::new(PhotoStore::open(&config.store).context("Failed to open photo store")?);

    match cli.command.as_str() {
        "capture" => {
            let image = PathBuf::from(positional(&cli.args, "IMAGE")?);
            let locator: Box<dyn Locator> = match coordinates_arg(&cli.args)? {
                Some(coords) => Box::new(FixedLocator::new(Some(coords))),
                None => Box::new(
                    LocatorChain::new()
                        .then(ExifLocator::new(&image))
                        .then(FixedLocator::new(config.capture.location_fallback)),
                ),
            };

            let captured = capture::capture(&store, &FileCamera::new(&image), locator.as_ref())?;
            match captured.key {
                Some(key) => println!("{}", key),
                None => eprintln!("Photo was not saved"),
            }
        }
        "import" => {
            let dir = PathBuf::from(positional(&cli.args, "DIR")?);
            let summary = capture::import_directory(&store, &dir, &config.capture)?;
            println!(
                "Imported {} photos ({} with location, {} failed)",
                summary.imported, summary.located, summary.failed
            );
        }
        "map" => {
            let locator = FixedLocator::new(
                coordinates_arg(&cli.args)?.or(config.capture.location_fallback),
            );
            match MapScreen::build(&store.list_all(), &locator, &config.map) {
                MapScreen::Ready { region, markers } => {
                    println!(
                        "Region {:.6}, {:.6} (±{} / ±{})",
                        region.latitude,
                        region.longitude,
                        region.latitude_delta,
                        region.longitude_delta
                    );
                    for marker in markers {
                        println!(
                            "{:<12} {:>11.6} {:>11.6}  {}",
                            marker.title,
                            marker.coordinate.latitude,
                            marker.coordinate.longitude,
                            marker.image_uri.as_deref().unwrap_or("")
                        );
                    }
                }
                MapScreen::Unavailable { message } => println!("{}", message),
            }
        }
        "share" => {
            let request = map::share(&positional(&cli.args, "URI")?);
            println!("{}", request.message);
        }
        "library" => {
            let mut library = Library::new(store);
            print_entries(library.refresh());
        }
        "watch" => {
            let interval = Duration::from_secs(config.library.refresh_interval_secs);
            library::watch(store, interval, print_entries, async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await?;
        }
        "clear" => {
            let ack = Library::new(store).delete_all();
            println!("{}: {}", ack.title, ack.message);
            if !ack.success {
                std::process::exit(1);
            }
        }
        "export" => {
            let output = PathBuf::from(positional(&cli.args, "FILE")?);
            let format = match flag_value(&cli.args, "--format") {
                Some(name) => ExportFormat::parse(name)
                    .with_context(|| format!("unknown export format: {}", name))?,
                None => ExportFormat::from_path(&output),
            };
            let output = format.output_path(&output);
            let count = export_records(&store.list_all(), &output, format)?;
            println!("Exported {} photos as {} to {}", count, format.name(), output.display());
        }
        _ => unreachable!("commands are routed through Tab::for_command"),
    }

    Ok(())
}
