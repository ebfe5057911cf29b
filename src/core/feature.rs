//! Gemeinsamer Vertrag aller Feature-Knoten im KML-Baum.
//!
//! Der Baum ist eine geschlossene Menge von Varianten ([`FeatureNode`]).
//! Alle synchronen Fähigkeiten laufen über das [`Feature`]-Trait; der
//! Style-Pass ist asynchron und wird über [`FeatureNode::set_style`]
//! rekursiv verteilt.

use super::container::Container;
use super::ground_overlay::GroundOverlay;
use super::placemark::{Marker, Polyline};
use super::style::StyleRegistry;
use image::DynamicImage;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Skalare KML-Properties (Tag-Name → Text), vom Dokument-Builder befüllt.
pub type PropertyMap = HashMap<String, String>;

/// Listener für Benutzer-Interaktionen mit Features.
pub trait FeatureEventListener: Send + Sync {
    fn on_marker_click(&self, _marker: &Marker) {}
    fn on_polyline_click(&self, _polyline: &Polyline) {}
    fn on_ground_overlay_click(&self, _overlay: &GroundOverlay) {}
}

/// Geteilte Listener-Referenz; wird unverändert an alle Kinder weitergereicht.
pub type SharedListener = Arc<dyn FeatureEventListener>;

/// Zeichenziel für den Render-Hook. Die eigentliche Kartendarstellung liegt
/// außerhalb dieser Library.
pub trait RenderSink {
    fn draw_marker(&mut self, marker: &Marker);
    fn draw_polyline(&mut self, polyline: &Polyline);
    fn draw_ground_overlay(&mut self, overlay: &GroundOverlay);
}

/// Synchrone Fähigkeiten jedes Feature-Knotens.
pub trait Feature {
    /// Anzeigename
    fn name(&self) -> &str;

    /// Setzt den Aktiv-Zustand. Container geben ihn an alle Nachfahren weiter.
    fn set_active(&mut self, active: bool);

    fn is_active(&self) -> bool;

    /// Übernimmt skalare Properties aus dem Dokument.
    fn set_properties(&mut self, properties: &PropertyMap);

    /// Speichert den Listener bzw. reicht ihn an alle Kinder weiter.
    fn set_event_listener(&mut self, listener: SharedListener);

    /// Zeichnet das Feature, falls aktiv.
    fn render(&self, sink: &mut dyn RenderSink);
}

/// Zustand, den alle Varianten teilen.
#[derive(Debug, Clone)]
pub struct FeatureState {
    pub name: String,
    pub description: Option<String>,
    /// Effektive Sichtbarkeit nach Kaskade
    pub active: bool,
    /// Eigene Sichtbarkeit aus `<visibility>`
    pub visible: bool,
    pub style_url: Option<String>,
    pub draw_order: i32,
}

impl Default for FeatureState {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            active: true,
            visible: true,
            style_url: None,
            draw_order: 0,
        }
    }
}

impl FeatureState {
    /// Übernimmt die Properties, die alle Varianten verstehen
    /// (`name`, `description`, `visibility`, `styleUrl`, `drawOrder`).
    pub fn apply_common_properties(&mut self, properties: &PropertyMap) {
        if let Some(name) = properties.get("name") {
            self.name = name.trim().to_string();
        }
        if let Some(description) = properties.get("description") {
            self.description = Some(description.trim().to_string());
        }
        if let Some(style_url) = properties.get("styleUrl") {
            self.style_url = Some(style_url.trim().to_string());
        }
        if let Some(order) = properties.get("drawOrder") {
            match order.trim().parse::<i32>() {
                Ok(value) => self.draw_order = value,
                Err(_) => log::warn!("Ungueltige drawOrder '{}' ignoriert", order.trim()),
            }
        }
        if let Some(visibility) = properties.get("visibility") {
            match parse_kml_bool(visibility) {
                Some(value) => {
                    self.visible = value;
                    self.active = value;
                }
                None => log::warn!("Ungueltige visibility '{}' ignoriert", visibility.trim()),
            }
        }
    }

    /// Wendet die Eltern-Sichtbarkeit als Obergrenze an und gibt das Ergebnis zurück.
    pub fn apply_parent_visibility(&mut self, parent_visibility: bool) -> bool {
        self.active = parent_visibility && self.visible;
        self.active
    }
}

/// Parst einen KML-Boolean (`0`/`1`, zusätzlich `true`/`false`).
pub fn parse_kml_bool(text: &str) -> Option<bool> {
    match text.trim() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Löst ein Bild-Asset aus der Registry auf.
///
/// Einziger Suspensionspunkt des Style-Passes.
pub(crate) async fn resolve_image(
    registry: &StyleRegistry,
    href: &str,
) -> Option<Arc<DynamicImage>> {
    let image = registry.image(href);
    if image.is_none() {
        log::debug!("Bild-Asset '{}' nicht in der Registry", href);
    }
    image
}

/// Ein Knoten im Feature-Baum.
#[derive(Clone)]
pub enum FeatureNode {
    Container(Container),
    Marker(Marker),
    Polyline(Polyline),
    GroundOverlay(GroundOverlay),
}

impl FeatureNode {
    /// Style-Pass für diesen Knoten und (bei Containern) seinen Teilbaum.
    ///
    /// Die Rekursion läuft über eine geboxte Future, damit Container ihre
    /// Kinder der Reihe nach abwarten können.
    pub fn set_style<'a>(
        &'a mut self,
        registry: &'a StyleRegistry,
        parent_visibility: bool,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            match self {
                Self::Container(c) => c.set_style(registry, parent_visibility).await,
                Self::Marker(m) => m.set_style(registry, parent_visibility).await,
                Self::Polyline(p) => p.set_style(registry, parent_visibility).await,
                Self::GroundOverlay(g) => g.set_style(registry, parent_visibility).await,
            }
        })
    }

    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Self::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_container_mut(&mut self) -> Option<&mut Container> {
        match self {
            Self::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_marker(&self) -> Option<&Marker> {
        match self {
            Self::Marker(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_polyline(&self) -> Option<&Polyline> {
        match self {
            Self::Polyline(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_ground_overlay(&self) -> Option<&GroundOverlay> {
        match self {
            Self::GroundOverlay(g) => Some(g),
            _ => None,
        }
    }

    fn as_feature(&self) -> &dyn Feature {
        match self {
            Self::Container(c) => c,
            Self::Marker(m) => m,
            Self::Polyline(p) => p,
            Self::GroundOverlay(g) => g,
        }
    }

    fn as_feature_mut(&mut self) -> &mut dyn Feature {
        match self {
            Self::Container(c) => c,
            Self::Marker(m) => m,
            Self::Polyline(p) => p,
            Self::GroundOverlay(g) => g,
        }
    }
}

impl Feature for FeatureNode {
    fn name(&self) -> &str {
        self.as_feature().name()
    }

    fn set_active(&mut self, active: bool) {
        self.as_feature_mut().set_active(active);
    }

    fn is_active(&self) -> bool {
        self.as_feature().is_active()
    }

    fn set_properties(&mut self, properties: &PropertyMap) {
        self.as_feature_mut().set_properties(properties);
    }

    fn set_event_listener(&mut self, listener: SharedListener) {
        self.as_feature_mut().set_event_listener(listener);
    }

    fn render(&self, sink: &mut dyn RenderSink) {
        self.as_feature().render(sink);
    }
}

impl std::fmt::Debug for FeatureNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let variant = match self {
            Self::Container(_) => "Container",
            Self::Marker(_) => "Marker",
            Self::Polyline(_) => "Polyline",
            Self::GroundOverlay(_) => "GroundOverlay",
        };
        f.debug_struct(variant)
            .field("name", &self.name())
            .field("active", &self.is_active())
            .finish()
    }
}

impl From<Container> for FeatureNode {
    fn from(value: Container) -> Self {
        Self::Container(value)
    }
}

impl From<Marker> for FeatureNode {
    fn from(value: Marker) -> Self {
        Self::Marker(value)
    }
}

impl From<Polyline> for FeatureNode {
    fn from(value: Polyline) -> Self {
        Self::Polyline(value)
    }
}

impl From<GroundOverlay> for FeatureNode {
    fn from(value: GroundOverlay) -> Self {
        Self::GroundOverlay(value)
    }
}
