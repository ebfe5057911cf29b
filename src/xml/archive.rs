//! Laden von KML-Dateien und KMZ-Archiven (ZIP mit `doc.kml` und Bildern).

use super::document::{parse_kml_document, KmlDocument};
use crate::core::StyleRegistry;
use crate::shared::KmlOptions;
use anyhow::{Context, Result};
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::sync::Arc;

/// Bekannte Bild-Endungen für KMZ-Assets
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Lädt eine `.kml`- oder `.kmz`-Datei (Erkennung über die Dateiendung).
pub fn load_document(path: &Path, options: &KmlOptions) -> Result<KmlDocument> {
    let is_kmz = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("kmz"));

    if is_kmz {
        return load_kmz(path, options);
    }

    let markup = std::fs::read_to_string(path)
        .with_context(|| format!("KML-Datei nicht lesbar: {}", path.display()))?;
    parse_kml_document(&markup, options)
        .with_context(|| format!("Fehler in KML-Datei: {}", path.display()))
}

/// Lädt ein KMZ-Archiv von der Festplatte.
pub fn load_kmz(path: &Path, options: &KmlOptions) -> Result<KmlDocument> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("KMZ-Datei nicht gefunden: {}", path.display()))?;
    load_kmz_from_reader(BufReader::new(file), &path.display().to_string(), options)
}

/// Lädt ein KMZ-Archiv aus einem beliebigen Reader.
///
/// Das Haupt-Dokument ist `options.preferred_kml_entry` oder, falls nicht
/// vorhanden, die erste `.kml`-Datei im Archiv. Bild-Assets landen mit ihrem
/// Archiv-Pfad als Schlüssel in der Registry.
pub fn load_kmz_from_reader<R: Read + Seek>(
    reader: R,
    source_label: &str,
    options: &KmlOptions,
) -> Result<KmlDocument> {
    let mut archive = zip::ZipArchive::new(reader)
        .with_context(|| format!("Ungültiges KMZ-Archiv: {}", source_label))?;

    let entry_name = find_kml_entry(&mut archive, &options.preferred_kml_entry)?
        .with_context(|| format!("Keine .kml-Datei in {}", source_label))?;
    log::info!("KMZ '{}': Haupt-Dokument '{}'", source_label, entry_name);

    let markup = {
        let mut entry = archive
            .by_name(&entry_name)
            .with_context(|| format!("Eintrag '{}' nicht lesbar", entry_name))?;
        let mut buffer = String::with_capacity(entry.size() as usize);
        entry
            .read_to_string(&mut buffer)
            .with_context(|| format!("Eintrag '{}' ist kein gueltiges UTF-8", entry_name))?;
        buffer
    };

    let mut document = parse_kml_document(&markup, options)
        .with_context(|| format!("Fehler in '{}:{}'", source_label, entry_name))?;

    if options.decode_images {
        load_images(&mut archive, source_label, &mut document.registry)?;
    }
    Ok(document)
}

fn find_kml_entry<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    preferred: &str,
) -> Result<Option<String>> {
    let mut first_kml: Option<String> = None;
    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        if !entry.is_file() {
            continue;
        }
        let name = entry.name().to_string();
        if name.eq_ignore_ascii_case(preferred) {
            return Ok(Some(name));
        }
        if first_kml.is_none() && has_extension(&name, &["kml"]) {
            first_kml = Some(name);
        }
    }
    Ok(first_kml)
}

/// Dekodiert alle Bild-Einträge. Nicht dekodierbare Bilder werden mit
/// Warnung übersprungen.
fn load_images<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    source_label: &str,
    registry: &mut StyleRegistry,
) -> Result<()> {
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();
        if !entry.is_file() || !has_extension(&name, IMAGE_EXTENSIONS) {
            continue;
        }

        let mut buffer = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buffer)
            .with_context(|| format!("Fehler beim Lesen von '{}:{}'", source_label, name))?;

        match image::load_from_memory(&buffer) {
            Ok(image) => {
                log::debug!(
                    "KMZ-Bild '{}' geladen: {}x{}",
                    name,
                    image.width(),
                    image.height()
                );
                registry.images.insert(name, Arc::new(image));
            }
            Err(e) => log::warn!("KMZ-Bild '{}' nicht dekodierbar: {}", name, e),
        }
    }
    Ok(())
}

fn has_extension(name: &str, extensions: &[&str]) -> bool {
    let lower = name.to_ascii_lowercase();
    extensions
        .iter()
        .any(|ext| lower.ends_with(&format!(".{}", ext)))
}
