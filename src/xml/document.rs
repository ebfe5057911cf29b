//! Dokument-Builder: baut aus einem KML-Dokument den Feature-Baum und die
//! Style-Registry auf.
//!
//! Alle Teil-Parser starten auf ihrem öffnenden Tag und lassen den Cursor
//! auf ihrem schließenden Tag stehen; die Hauptschleife geht danach weiter.
//! Einzige Ausnahme ist `parse_extended_data`, das hinter dem Block endet.

use super::error::KmlError;
use super::feature_fields::{
    is_scalar_property, parse_coordinates, parse_extended_data, EXTENDED_DATA_TAG,
};
use super::token_stream::{EventKind, TokenStream};
use crate::core::feature::parse_kml_bool;
use crate::core::style::{KmlColor, KmlStyle, KmlStyleMap, StyleRegistry};
use crate::core::{
    Container, ExtendedData, Feature, FeatureNode, GroundOverlay, LatLng, LatLonBox, Marker,
    Polyline, PropertyMap, SharedListener,
};
use crate::shared::KmlOptions;
use anyhow::{bail, Context, Result};

/// Fertig geparstes Dokument: Baum plus Nachschlagetabellen.
#[derive(Debug, Clone, Default)]
pub struct KmlDocument {
    pub root: Container,
    pub registry: StyleRegistry,
}

impl KmlDocument {
    /// Führt den Style-Pass über den gesamten Baum aus.
    pub async fn apply_styles(&mut self, root_visibility: bool) {
        self.root.set_style(&self.registry, root_visibility).await;
    }

    /// Setzt den Listener für alle Features des Baums.
    pub fn set_event_listener(&mut self, listener: SharedListener) {
        self.root.set_event_listener(listener);
    }
}

/// Parst ein KML-Dokument aus einem String.
///
/// Fehlerhafte Koordinaten überspringen das betroffene Feature, wenn
/// `options.skip_malformed_features` gesetzt ist; sonst bricht der Parse ab.
/// Stream-Fehler brechen immer ab.
pub fn parse_kml_document(markup: &str, options: &KmlOptions) -> Result<KmlDocument> {
    let mut builder = DocumentBuilder::new(markup, options);
    builder.run().context("Fehler beim Parsen des KML-Dokuments")?;
    Ok(builder.finish())
}

/// Geometrie eines Placemarks vor dem Aufbau des Features
enum Geometry {
    Point(Vec<LatLng>),
    LineString(Vec<LatLng>),
}

/// Abschnitt innerhalb eines `<Style>`-Blocks
#[derive(Clone, Copy, PartialEq, Eq)]
enum StyleSection {
    Icon,
    Line,
    Poly,
}

struct DocumentBuilder<'a, 'o> {
    stream: TokenStream<'a>,
    options: &'o KmlOptions,
    /// Offene Folder mit ihren gesammelten Properties; Index 0 ist die Wurzel
    stack: Vec<(Container, PropertyMap)>,
    registry: StyleRegistry,
    inline_styles: usize,
    skipped_features: usize,
    root_document_merged: bool,
}

impl<'a, 'o> DocumentBuilder<'a, 'o> {
    fn new(markup: &'a str, options: &'o KmlOptions) -> Self {
        Self {
            stream: TokenStream::new(markup),
            options,
            stack: vec![(Container::new(), PropertyMap::new())],
            registry: StyleRegistry::new(),
            inline_styles: 0,
            skipped_features: 0,
            root_document_merged: false,
        }
    }

    fn current_tag(&self) -> String {
        self.stream.current_tag_name().unwrap_or_default().to_string()
    }

    fn run(&mut self) -> Result<()> {
        self.stream.advance()?;

        loop {
            match self.stream.current_kind() {
                EventKind::DocumentEnd => break,
                EventKind::TagOpen => {
                    let tag = self.current_tag();
                    match tag.as_str() {
                        "kml" => {}
                        // Ein Document direkt unter <kml> ist die Wurzel selbst
                        "Document" if self.stack.len() == 1 && !self.root_document_merged => {
                            self.root_document_merged = true;
                        }
                        "Document" | "Folder" => {
                            self.stack.push((Container::new(), PropertyMap::new()));
                        }
                        "Placemark" => self.parse_placemark()?,
                        "GroundOverlay" => self.parse_ground_overlay()?,
                        "Style" => {
                            let (id, style) = self.parse_style()?;
                            match id {
                                Some(id) => {
                                    self.registry.styles.insert(id, style);
                                }
                                None => log::debug!("Style ohne id ignoriert"),
                            }
                        }
                        "StyleMap" => self.parse_style_map()?,
                        t if is_scalar_property(t) => {
                            let text = self.stream.read_text_until_tag_close()?;
                            if let Some((_, properties)) = self.stack.last_mut() {
                                properties.insert(tag, text);
                            }
                        }
                        _ => {
                            log::debug!("Nicht unterstuetzter Tag <{}> uebersprungen", tag);
                            self.stream.skip_element()?;
                        }
                    }
                }
                EventKind::TagClose => {
                    let tag = self.current_tag();
                    if (tag == "Document" || tag == "Folder") && self.stack.len() > 1 {
                        self.close_container();
                    }
                }
                EventKind::DocumentStart | EventKind::Text => {}
            }
            self.stream.advance()?;
        }

        if self.stack.len() > 1 {
            bail!("{} Container nicht geschlossen", self.stack.len() - 1);
        }
        Ok(())
    }

    fn close_container(&mut self) {
        if let Some((mut container, properties)) = self.stack.pop() {
            container.set_properties(&properties);
            self.attach(container);
        }
    }

    fn attach(&mut self, feature: impl Into<FeatureNode>) {
        if let Some((parent, _)) = self.stack.last_mut() {
            parent.add_child(feature);
        }
    }

    fn finish(mut self) -> KmlDocument {
        let (mut root, properties) = self
            .stack
            .pop()
            .unwrap_or_else(|| (Container::new(), PropertyMap::new()));
        root.set_properties(&properties);

        let counts = root.feature_counts();
        log::info!(
            "KML geladen: {} Container, {} Marker, {} Linien, {} Overlays, {} Styles, {} StyleMaps",
            counts.containers,
            counts.markers,
            counts.polylines,
            counts.ground_overlays,
            self.registry.styles.len(),
            self.registry.style_maps.len()
        );
        if self.skipped_features > 0 {
            log::warn!(
                "{} fehlerhafte Features uebersprungen",
                self.skipped_features
            );
        }

        KmlDocument {
            root,
            registry: self.registry,
        }
    }

    /// Bricht ab, wenn das Dokument innerhalb eines Blocks endet.
    fn ensure_not_eof(&self, block: &str) -> Result<()> {
        if self.stream.current_kind() == EventKind::DocumentEnd {
            return Err(KmlError::Truncated(block.to_string()).into());
        }
        Ok(())
    }

    /// Entscheidet bei einem Formatfehler über Überspringen oder Abbruch.
    fn handle_malformed(&mut self, feature: &str, name: &str, err: KmlError) -> Result<()> {
        if self.options.skip_malformed_features {
            log::warn!("{} '{}' uebersprungen: {}", feature, name, err);
            self.skipped_features += 1;
            Ok(())
        } else {
            Err(err).with_context(|| format!("Fehlerhaftes {} '{}'", feature, name))
        }
    }

    fn parse_placemark(&mut self) -> Result<()> {
        let mut properties = PropertyMap::new();
        let mut extended_data: Vec<ExtendedData> = Vec::new();
        let mut geometry: Option<Geometry> = None;
        let mut malformed: Option<KmlError> = None;

        self.stream.advance()?;
        while !self.stream.is_close("Placemark") {
            self.ensure_not_eof("Placemark")?;
            if self.stream.current_kind() == EventKind::TagOpen {
                let tag = self.current_tag();
                match tag.as_str() {
                    EXTENDED_DATA_TAG => {
                        extended_data = parse_extended_data(&mut self.stream)?;
                        // Cursor steht bereits hinter </ExtendedData>
                        continue;
                    }
                    "Point" | "LineString" => {
                        match self.parse_geometry_coordinates(&tag, &mut properties)? {
                            Ok(points) if tag == "Point" => geometry = Some(Geometry::Point(points)),
                            Ok(points) => geometry = Some(Geometry::LineString(points)),
                            Err(err) => malformed = Some(err),
                        }
                    }
                    "Style" => {
                        let (_, style) = self.parse_style()?;
                        self.inline_styles += 1;
                        let id = format!("__inline_style_{}", self.inline_styles);
                        self.registry.styles.insert(id.clone(), style);
                        properties
                            .entry("styleUrl".to_string())
                            .or_insert(format!("#{id}"));
                    }
                    t if is_scalar_property(t) => {
                        let text = self.stream.read_text_until_tag_close()?;
                        properties.insert(tag, text);
                    }
                    _ => {
                        log::debug!("Placemark: <{}> uebersprungen", tag);
                        self.stream.skip_element()?;
                    }
                }
            }
            self.stream.advance()?;
        }

        let name = properties
            .get("name")
            .map(|n| n.trim().to_string())
            .unwrap_or_default();
        if let Some(err) = malformed {
            return self.handle_malformed("Placemark", &name, err);
        }

        match geometry {
            Some(Geometry::Point(points)) => {
                let Some(position) = points.first().copied() else {
                    let err = KmlError::MissingCoordinate {
                        line: 1,
                        content: String::new(),
                    };
                    return self.handle_malformed("Placemark", &name, err);
                };
                let mut marker = Marker::new(position);
                marker.set_properties(&properties);
                marker.extended_data = extended_data;
                self.attach(marker);
            }
            Some(Geometry::LineString(points)) => {
                let mut polyline = Polyline::new(points);
                polyline.set_properties(&properties);
                polyline.extended_data = extended_data;
                self.attach(polyline);
            }
            None => log::debug!("Placemark '{}' ohne unterstuetzte Geometrie", name),
        }
        Ok(())
    }

    /// Liest `<coordinates>` einer Geometrie. Skalare Properties innerhalb der
    /// Geometrie (z.B. `<tessellate>`) landen in `properties`.
    ///
    /// Äußeres `Result`: Stream-Fehler. Inneres `Result`: Formatfehler.
    fn parse_geometry_coordinates(
        &mut self,
        geometry_tag: &str,
        properties: &mut PropertyMap,
    ) -> Result<Result<Vec<LatLng>, KmlError>> {
        let mut points = Ok(Vec::new());

        self.stream.advance()?;
        while !self.stream.is_close(geometry_tag) {
            self.ensure_not_eof(geometry_tag)?;
            if self.stream.current_kind() == EventKind::TagOpen {
                let tag = self.current_tag();
                if tag == "coordinates" {
                    let text = self.stream.read_text_until_tag_close()?;
                    points = parse_coordinates(&text);
                } else if is_scalar_property(&tag) {
                    let text = self.stream.read_text_until_tag_close()?;
                    properties.insert(tag, text);
                } else {
                    self.stream.skip_element()?;
                }
            }
            self.stream.advance()?;
        }
        Ok(points)
    }

    fn parse_ground_overlay(&mut self) -> Result<()> {
        let mut properties = PropertyMap::new();
        let mut bounds = LatLonBox::default();
        let mut icon_href: Option<String> = None;
        let mut in_lat_lon_box = false;

        self.stream.advance()?;
        while !self.stream.is_close("GroundOverlay") {
            self.ensure_not_eof("GroundOverlay")?;
            match self.stream.current_kind() {
                EventKind::TagOpen => {
                    let tag = self.current_tag();
                    match tag.as_str() {
                        "Icon" => {}
                        "href" => {
                            let href = self.stream.read_text_until_tag_close()?;
                            icon_href = Some(href.trim().to_string());
                        }
                        "LatLonBox" => in_lat_lon_box = true,
                        edge if in_lat_lon_box => {
                            let text = self.stream.read_text_until_tag_close()?;
                            match text.trim().parse::<f64>() {
                                Ok(value) => {
                                    bounds.set_edge(edge, value);
                                }
                                Err(_) => log::warn!(
                                    "GroundOverlay: ungueltiger Wert '{}' fuer <{}>",
                                    text.trim(),
                                    edge
                                ),
                            }
                        }
                        t if is_scalar_property(t) => {
                            let text = self.stream.read_text_until_tag_close()?;
                            properties.insert(tag, text);
                        }
                        _ => self.stream.skip_element()?,
                    }
                }
                EventKind::TagClose if self.stream.is_close("LatLonBox") => in_lat_lon_box = false,
                _ => {}
            }
            self.stream.advance()?;
        }

        let mut overlay = GroundOverlay::new(bounds, icon_href);
        overlay.set_properties(&properties);
        self.attach(overlay);
        Ok(())
    }

    fn parse_style(&mut self) -> Result<(Option<String>, KmlStyle)> {
        let id = self.stream.attribute_value("Style", "id")?;
        let mut style = KmlStyle::default();
        let mut section: Option<StyleSection> = None;

        self.stream.advance()?;
        while !self.stream.is_close("Style") {
            self.ensure_not_eof("Style")?;
            match self.stream.current_kind() {
                EventKind::TagOpen => {
                    let tag = self.current_tag();
                    match tag.as_str() {
                        "IconStyle" => section = Some(StyleSection::Icon),
                        "LineStyle" => section = Some(StyleSection::Line),
                        "PolyStyle" => section = Some(StyleSection::Poly),
                        "Icon" if section == Some(StyleSection::Icon) => {}
                        _ if section.is_some() => {
                            let text = self.stream.read_text_until_tag_close()?;
                            apply_style_field(&mut style, section, &tag, text.trim());
                        }
                        _ => self.stream.skip_element()?,
                    }
                }
                EventKind::TagClose => {
                    if matches!(
                        self.stream.current_tag_name(),
                        Some("IconStyle" | "LineStyle" | "PolyStyle")
                    ) {
                        section = None;
                    }
                }
                _ => {}
            }
            self.stream.advance()?;
        }
        Ok((id, style))
    }

    fn parse_style_map(&mut self) -> Result<()> {
        let id = self.stream.attribute_value("StyleMap", "id")?;
        let mut style_map = KmlStyleMap::default();
        let mut key: Option<String> = None;
        let mut style_url: Option<String> = None;

        self.stream.advance()?;
        while !self.stream.is_close("StyleMap") {
            self.ensure_not_eof("StyleMap")?;
            match self.stream.current_kind() {
                EventKind::TagOpen => match self.current_tag().as_str() {
                    "Pair" => {}
                    "key" => {
                        let text = self.stream.read_text_until_tag_close()?;
                        key = Some(text.trim().to_string());
                    }
                    "styleUrl" => style_url = Some(self.stream.read_text_until_tag_close()?),
                    _ => self.stream.skip_element()?,
                },
                EventKind::TagClose if self.stream.is_close("Pair") => {
                    match (key.take(), style_url.take()) {
                        (Some(k), Some(url)) => style_map.insert(k, &url),
                        _ => log::debug!("StyleMap-Pair ohne key/styleUrl ignoriert"),
                    }
                }
                _ => {}
            }
            self.stream.advance()?;
        }

        match id {
            Some(id) => {
                self.registry.style_maps.insert(id, style_map);
            }
            None => log::debug!("StyleMap ohne id ignoriert"),
        }
        Ok(())
    }
}

fn apply_style_field(style: &mut KmlStyle, section: Option<StyleSection>, tag: &str, text: &str) {
    match (section, tag) {
        (Some(StyleSection::Icon), "href") => style.icon_url = Some(text.to_string()),
        (Some(StyleSection::Icon), "scale") => {
            style.icon_scale = text.parse().unwrap_or(style.icon_scale);
        }
        (Some(StyleSection::Icon), "heading") => {
            style.icon_heading = text.parse().unwrap_or(style.icon_heading);
        }
        (Some(StyleSection::Icon), "color") => style.icon_color = KmlColor::from_kml_hex(text),
        (Some(StyleSection::Line), "color") => style.line_color = KmlColor::from_kml_hex(text),
        (Some(StyleSection::Line), "width") => {
            style.line_width = text.parse().unwrap_or(style.line_width);
        }
        (Some(StyleSection::Poly), "color") => style.poly_color = KmlColor::from_kml_hex(text),
        (Some(StyleSection::Poly), "fill") => {
            style.poly_fill = parse_kml_bool(text).unwrap_or(true);
        }
        (Some(StyleSection::Poly), "outline") => {
            style.poly_outline = parse_kml_bool(text).unwrap_or(true);
        }
        _ => log::debug!("Style-Feld <{}> ignoriert", tag),
    }
}
