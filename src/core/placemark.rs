//! Placemark-Varianten: Marker (`<Point>`) und Polylinie (`<LineString>`).

use super::extended_data::ExtendedData;
use super::feature::{
    parse_kml_bool, resolve_image, Feature, FeatureState, PropertyMap, RenderSink,
    SharedListener,
};
use super::geometry::LatLng;
use super::style::{KmlStyle, StyleRegistry};
use image::DynamicImage;
use std::sync::Arc;

/// Punkt-Feature aus einem Placemark mit `<Point>`.
#[derive(Clone)]
pub struct Marker {
    state: FeatureState,
    position: LatLng,
    pub extended_data: Vec<ExtendedData>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    style: Option<KmlStyle>,
    icon: Option<Arc<DynamicImage>>,
    listener: Option<SharedListener>,
}

impl Marker {
    /// Erstellt einen Marker an der angegebenen Position
    pub fn new(position: LatLng) -> Self {
        Self {
            state: FeatureState::default(),
            position,
            extended_data: Vec::new(),
            address: None,
            phone_number: None,
            style: None,
            icon: None,
            listener: None,
        }
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    pub fn state(&self) -> &FeatureState {
        &self.state
    }

    /// Aufgelöster Style nach dem Style-Pass
    pub fn style(&self) -> Option<&KmlStyle> {
        self.style.as_ref()
    }

    /// Aufgelöstes Icon-Bild, falls das Asset in der Registry lag
    pub fn icon(&self) -> Option<&Arc<DynamicImage>> {
        self.icon.as_ref()
    }

    /// Leitet einen Klick an den gesetzten Listener weiter.
    pub fn click(&self) {
        if let Some(listener) = &self.listener {
            listener.on_marker_click(self);
        }
    }

    pub async fn set_style(&mut self, registry: &StyleRegistry, parent_visibility: bool) {
        self.state.apply_parent_visibility(parent_visibility);
        self.style = self
            .state
            .style_url
            .as_deref()
            .and_then(|url| registry.resolve(url))
            .cloned();

        let href = self.style.as_ref().and_then(|s| s.icon_url.clone());
        self.icon = match href {
            Some(href) => resolve_image(registry, &href).await,
            None => None,
        };
    }
}

impl Feature for Marker {
    fn name(&self) -> &str {
        &self.state.name
    }

    fn set_active(&mut self, active: bool) {
        self.state.active = active;
    }

    fn is_active(&self) -> bool {
        self.state.active
    }

    fn set_properties(&mut self, properties: &PropertyMap) {
        self.state.apply_common_properties(properties);
        if let Some(address) = properties.get("address") {
            self.address = Some(address.trim().to_string());
        }
        if let Some(phone) = properties.get("phoneNumber") {
            self.phone_number = Some(phone.trim().to_string());
        }
    }

    fn set_event_listener(&mut self, listener: SharedListener) {
        self.listener = Some(listener);
    }

    fn render(&self, sink: &mut dyn RenderSink) {
        if self.state.active {
            sink.draw_marker(self);
        }
    }
}

/// Linien-Feature aus einem Placemark mit `<LineString>`.
#[derive(Clone)]
pub struct Polyline {
    state: FeatureState,
    points: Vec<LatLng>,
    /// Linie folgt dem Gelände (`<tessellate>`)
    pub tessellate: bool,
    pub extended_data: Vec<ExtendedData>,
    style: Option<KmlStyle>,
    listener: Option<SharedListener>,
}

impl Polyline {
    /// Erstellt eine Polylinie; die Punktreihenfolge bleibt erhalten.
    pub fn new(points: Vec<LatLng>) -> Self {
        Self {
            state: FeatureState::default(),
            points,
            tessellate: false,
            extended_data: Vec::new(),
            style: None,
            listener: None,
        }
    }

    pub fn points(&self) -> &[LatLng] {
        &self.points
    }

    pub fn state(&self) -> &FeatureState {
        &self.state
    }

    pub fn style(&self) -> Option<&KmlStyle> {
        self.style.as_ref()
    }

    /// Leitet einen Klick an den gesetzten Listener weiter.
    pub fn click(&self) {
        if let Some(listener) = &self.listener {
            listener.on_polyline_click(self);
        }
    }

    pub async fn set_style(&mut self, registry: &StyleRegistry, parent_visibility: bool) {
        self.state.apply_parent_visibility(parent_visibility);
        self.style = self
            .state
            .style_url
            .as_deref()
            .and_then(|url| registry.resolve(url))
            .cloned();
    }
}

impl Feature for Polyline {
    fn name(&self) -> &str {
        &self.state.name
    }

    fn set_active(&mut self, active: bool) {
        self.state.active = active;
    }

    fn is_active(&self) -> bool {
        self.state.active
    }

    fn set_properties(&mut self, properties: &PropertyMap) {
        self.state.apply_common_properties(properties);
        if let Some(tessellate) = properties.get("tessellate") {
            self.tessellate = parse_kml_bool(tessellate).unwrap_or(false);
        }
    }

    fn set_event_listener(&mut self, listener: SharedListener) {
        self.listener = Some(listener);
    }

    fn render(&self, sink: &mut dyn RenderSink) {
        if self.state.active {
            sink.draw_polyline(self);
        }
    }
}
