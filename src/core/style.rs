//! Style-Modell und Registry für `<Style>`, `<StyleMap>` und Bild-Assets.

use image::DynamicImage;
use indexmap::IndexMap;
use std::sync::Arc;

/// Standard-State einer StyleMap
pub const STYLE_STATE_NORMAL: &str = "normal";
/// Hervorgehobener State einer StyleMap
pub const STYLE_STATE_HIGHLIGHT: &str = "highlight";

/// RGBA-Farbe aus einem KML-Farbwert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KmlColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl KmlColor {
    /// Parst einen KML-Farbwert im Format `aabbggrr` (Hex, optional mit `#`).
    pub fn from_kml_hex(text: &str) -> Option<Self> {
        let hex = text.trim().trim_start_matches('#');
        if hex.len() != 8 {
            return None;
        }
        let value = u32::from_str_radix(hex, 16).ok()?;
        let [a, b, g, r] = value.to_be_bytes();
        Some(Self { r, g, b, a })
    }
}

/// Inhalt eines `<Style>`-Blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct KmlStyle {
    /// `IconStyle/Icon/href`
    pub icon_url: Option<String>,
    pub icon_scale: f32,
    pub icon_heading: f32,
    pub icon_color: Option<KmlColor>,
    pub line_color: Option<KmlColor>,
    pub line_width: f32,
    pub poly_color: Option<KmlColor>,
    pub poly_fill: bool,
    pub poly_outline: bool,
}

impl Default for KmlStyle {
    fn default() -> Self {
        Self {
            icon_url: None,
            icon_scale: 1.0,
            icon_heading: 0.0,
            icon_color: None,
            line_color: None,
            line_width: 1.0,
            poly_color: None,
            poly_fill: true,
            poly_outline: true,
        }
    }
}

/// Inhalt eines `<StyleMap>`-Blocks: State-Name → Style-ID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KmlStyleMap {
    pairs: IndexMap<String, String>,
}

impl KmlStyleMap {
    /// Fügt ein `<Pair>` hinzu. Ein führendes `#` der Style-URL wird entfernt.
    pub fn insert(&mut self, state: impl Into<String>, style_url: &str) {
        self.pairs
            .insert(state.into(), strip_fragment(style_url).to_string());
    }

    /// Style-ID für einen State
    pub fn style_id(&self, state: &str) -> Option<&str> {
        self.pairs.get(state).map(String::as_str)
    }

    pub fn normal(&self) -> Option<&str> {
        self.style_id(STYLE_STATE_NORMAL)
    }
}

/// Nur-lesende Nachschlagetabellen für den Style-Pass.
///
/// Die Reihenfolge entspricht der Dokumentreihenfolge. Bilder liegen als
/// `Arc`, damit mehrere Features dasselbe Asset teilen können.
#[derive(Debug, Clone, Default)]
pub struct StyleRegistry {
    pub styles: IndexMap<String, KmlStyle>,
    pub style_maps: IndexMap<String, KmlStyleMap>,
    pub images: IndexMap<String, Arc<DynamicImage>>,
}

impl StyleRegistry {
    /// Erstellt eine leere Registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Löst eine `styleUrl` zum effektiven Style auf.
    ///
    /// Verweist die URL auf eine StyleMap, wird deren `normal`-Eintrag
    /// verwendet (genau eine Indirektionsstufe).
    pub fn resolve(&self, style_url: &str) -> Option<&KmlStyle> {
        let id = strip_fragment(style_url);
        match self.style_maps.get(id) {
            Some(map) => map.normal().and_then(|normal| self.styles.get(normal)),
            None => self.styles.get(id),
        }
    }

    /// Löst eine `styleUrl` für einen bestimmten StyleMap-State auf.
    pub fn resolve_state(&self, style_url: &str, state: &str) -> Option<&KmlStyle> {
        let id = strip_fragment(style_url);
        match self.style_maps.get(id) {
            Some(map) => map.style_id(state).and_then(|sid| self.styles.get(sid)),
            None => self.styles.get(id),
        }
    }

    /// Dekodiertes Bild zu einer Asset-Referenz
    pub fn image(&self, href: &str) -> Option<Arc<DynamicImage>> {
        self.images.get(href).cloned()
    }
}

/// Entfernt ein führendes `#` aus einer Style-URL (`#style1` → `style1`).
pub fn strip_fragment(style_url: &str) -> &str {
    let trimmed = style_url.trim();
    trimmed.strip_prefix('#').unwrap_or(trimmed)
}
