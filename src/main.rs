//! kml-tree: gibt die Container-Struktur einer KML/KMZ-Datei aus.

use anyhow::Result;
use clap::Parser;
use kml_feature_tree::core::{Container, Feature};
use kml_feature_tree::{load_document, KmlOptions};
use std::path::PathBuf;

/// Lädt eine KML/KMZ-Datei und listet die Container bis zur gewünschten Tiefe.
#[derive(Debug, Parser)]
#[command(name = "kml-tree", version, about)]
struct Cli {
    /// Pfad zur .kml- oder .kmz-Datei
    file: PathBuf,

    /// Tiefe der aufgelisteten Container (0 = nur Wurzel)
    #[arg(short, long, default_value_t = 1)]
    depth: usize,

    /// Optionen-Datei (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Style-Pass mit unsichtbarer Wurzel ausführen
    #[arg(long)]
    hidden: bool,

    /// Aktive Optionen als TOML-Datei speichern (z.B. als Vorlage für --config)
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let options = match &cli.config {
        Some(path) => KmlOptions::load_from_file(path),
        None => KmlOptions::default(),
    };
    if let Some(path) = &cli.write_config {
        options.save_to_file(path)?;
    }

    let mut document = load_document(&cli.file, &options)?;
    let root_visibility = options.root_visibility && !cli.hidden;
    pollster::block_on(document.apply_styles(root_visibility));

    for container in document.root.containers_at_depth(cli.depth) {
        print_container(container);
    }
    Ok(())
}

fn print_container(container: &Container) {
    let counts = container.feature_counts();
    let name = if container.name().is_empty() {
        "<ohne Namen>"
    } else {
        container.name()
    };
    println!(
        "{} [{}] {} Ordner, {} Marker, {} Linien, {} Overlays",
        name,
        if container.is_active() { "sichtbar" } else { "versteckt" },
        counts.containers,
        counts.markers,
        counts.polylines,
        counts.ground_overlays
    );
}
