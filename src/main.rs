use clap::{Parser, Subcommand};
use std::path::PathBuf;

use skipp_app::client::ApiClient;
use skipp_app::config::{EnvOverrides, ServerConfig};
use skipp_app::serve::serve_app;
use skipp_app::views::map::{MapView, AVAILABLE_ICON, TAKEN_ICON};

#[derive(Parser, Debug)]
#[command(author, version, about = "List household objects for free pickup and find them on a map")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the record API, uploads and the web client
    Serve {
        /// Path to config file (TOML format)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides PORT and the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the map markers a running server would show
    Markers {
        /// Base URL of the server
        #[arg(short, long, default_value = "http://localhost:5050")]
        server: String,
    },
    /// Inquire about an available object
    Inquire {
        /// Base URL of the server
        #[arg(short, long, default_value = "http://localhost:5050")]
        server: String,

        /// Record id
        id: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match args.command {
        Command::Serve { config, port } => {
            let file_config = match config {
                Some(path) => ServerConfig::load(&path)?,
                None => ServerConfig::default(),
            };
            let settings = file_config.resolve(&EnvOverrides::from_env(), port)?;
            serve_app(settings)
        }
        Command::Markers { server } => print_markers(&server),
        Command::Inquire { server, id } => inquire(&server, &id),
    }
}

fn icon_name(icon: &'static skipp_app::views::map::MapIcon) -> &'static str {
    if std::ptr::eq(icon, &AVAILABLE_ICON) {
        "available"
    } else if std::ptr::eq(icon, &TAKEN_ICON) {
        "taken"
    } else {
        "inquired"
    }
}

async fn loaded_map(server: &str) -> Result<(ApiClient, MapView), Box<dyn std::error::Error>> {
    let client = ApiClient::new(server).map_err(|e| e.to_string())?;
    let mut view = MapView::new();
    view.init_map();
    view.load(&client).await;
    Ok((client, view))
}

fn print_markers(server: &str) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let (_, view) = loaded_map(server).await?;

        for marker in view.markers() {
            println!(
                "{}  {:>10.5} {:>11.5}  {:<9} {}{}",
                marker.record_id,
                marker.position.lat,
                marker.position.lon,
                icon_name(marker.icon),
                marker.popup.title,
                if marker.popup.show_inquire { "  [inquire]" } else { "" }
            );
        }
        if let Some((bounds, _)) = view.map().and_then(|m| m.fitted) {
            println!(
                "Bounds: ({}, {}) - ({}, {})",
                bounds.south_west.lat, bounds.south_west.lon, bounds.north_east.lat, bounds.north_east.lon
            );
        }
        println!("{} marker(s)", view.markers().len());
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

fn inquire(server: &str, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let (client, mut view) = loaded_map(server).await?;

        match view.marker(id) {
            Some(marker) if marker.popup.show_inquire => {}
            Some(_) => return Err(format!("Record {} is not available", id).into()),
            None => return Err(format!("Record {} is not on the map", id).into()),
        }

        let ok = view.inquire(&client, id).await;
        for alert in view.take_alerts() {
            println!("{}", alert);
        }
        if !ok {
            return Err("Inquire failed".into());
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
