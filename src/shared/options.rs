//! Zentrale Konfiguration für das Laden von KML/KMZ-Dokumenten.
//!
//! `KmlOptions` enthält alle zur Laufzeit änderbaren Werte.
//! Die `const`-Werte bleiben als Fallback/Default erhalten.

use serde::{Deserialize, Serialize};

/// Fehlerhafte Features überspringen statt das Dokument abzubrechen.
pub const SKIP_MALFORMED_FEATURES: bool = true;
/// Sichtbarkeit, die der Style-Pass an die Wurzel übergibt.
pub const ROOT_VISIBILITY: bool = true;
/// Bevorzugter Dateiname des Haupt-Dokuments in einem KMZ-Archiv.
pub const PREFERRED_KML_ENTRY: &str = "doc.kml";
/// Bild-Assets aus KMZ-Archiven beim Laden dekodieren.
pub const DECODE_IMAGES: bool = true;

/// Optionen für Parser und Archiv-Loader.
/// Wird als `kml_feature_tree.toml` gespeichert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KmlOptions {
    /// Placemarks mit fehlerhaften Koordinaten überspringen (sonst Abbruch)
    #[serde(default = "default_skip_malformed_features")]
    pub skip_malformed_features: bool,
    /// Sichtbarkeit der Wurzel im Style-Pass
    #[serde(default = "default_root_visibility")]
    pub root_visibility: bool,
    /// Haupt-Dokument im KMZ-Archiv
    #[serde(default = "default_preferred_kml_entry")]
    pub preferred_kml_entry: String,
    /// Bild-Assets aus KMZ dekodieren
    #[serde(default = "default_decode_images")]
    pub decode_images: bool,
}

impl Default for KmlOptions {
    fn default() -> Self {
        Self {
            skip_malformed_features: SKIP_MALFORMED_FEATURES,
            root_visibility: ROOT_VISIBILITY,
            preferred_kml_entry: PREFERRED_KML_ENTRY.to_string(),
            decode_images: DECODE_IMAGES,
        }
    }
}

fn default_skip_malformed_features() -> bool {
    SKIP_MALFORMED_FEATURES
}

fn default_root_visibility() -> bool {
    ROOT_VISIBILITY
}

fn default_preferred_kml_entry() -> String {
    PREFERRED_KML_ENTRY.to_string()
}

fn default_decode_images() -> bool {
    DECODE_IMAGES
}

impl KmlOptions {
    /// Lädt Optionen aus einer TOML-Datei. Bei Fehler: Standardwerte.
    pub fn load_from_file(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(opts) => {
                    log::info!("Optionen geladen aus: {}", path.display());
                    opts
                }
                Err(e) => {
                    log::warn!("Optionen-Datei fehlerhaft, verwende Standardwerte: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Keine Optionen-Datei gefunden, verwende Standardwerte");
                Self::default()
            }
        }
    }

    /// Speichert Optionen als TOML-Datei.
    pub fn save_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("Optionen gespeichert nach: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let opts: KmlOptions = toml::from_str("skip_malformed_features = false").unwrap();
        assert!(!opts.skip_malformed_features);
        assert!(opts.root_visibility);
        assert_eq!(opts.preferred_kml_entry, "doc.kml");
    }

    #[test]
    fn test_toml_roundtrip() {
        let opts = KmlOptions {
            root_visibility: false,
            preferred_kml_entry: "main.kml".to_string(),
            ..KmlOptions::default()
        };
        let text = toml::to_string_pretty(&opts).unwrap();
        let parsed: KmlOptions = toml::from_str(&text).unwrap();
        assert_eq!(parsed, opts);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!(
            "kml_feature_tree_options_{}.toml",
            std::process::id()
        ));
        let opts = KmlOptions {
            skip_malformed_features: false,
            decode_images: false,
            ..KmlOptions::default()
        };

        opts.save_to_file(&path).unwrap();
        let loaded = KmlOptions::load_from_file(&path);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, opts);
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let path = std::path::Path::new("/nonexistent/dir/kml.toml");
        assert!(KmlOptions::default().save_to_file(path).is_err());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let opts = KmlOptions::load_from_file(std::path::Path::new("/nonexistent/kml.toml"));
        assert_eq!(opts, KmlOptions::default());
    }
}
