//! Ground-Overlay: Bild, das über eine `<LatLonBox>` auf die Karte gelegt wird.

use super::feature::{
    resolve_image, Feature, FeatureState, PropertyMap, RenderSink, SharedListener,
};
use super::geometry::LatLonBox;
use super::style::StyleRegistry;
use image::DynamicImage;
use std::sync::Arc;

#[derive(Clone)]
pub struct GroundOverlay {
    state: FeatureState,
    bounds: LatLonBox,
    /// `Icon/href` aus dem Dokument
    icon_href: Option<String>,
    image: Option<Arc<DynamicImage>>,
    listener: Option<SharedListener>,
}

impl GroundOverlay {
    pub fn new(bounds: LatLonBox, icon_href: Option<String>) -> Self {
        Self {
            state: FeatureState::default(),
            bounds,
            icon_href,
            image: None,
            listener: None,
        }
    }

    pub fn bounds(&self) -> &LatLonBox {
        &self.bounds
    }

    pub fn icon_href(&self) -> Option<&str> {
        self.icon_href.as_deref()
    }

    /// Dekodiertes Overlay-Bild nach dem Style-Pass
    pub fn image(&self) -> Option<&Arc<DynamicImage>> {
        self.image.as_ref()
    }

    pub fn state(&self) -> &FeatureState {
        &self.state
    }

    /// Leitet einen Klick an den gesetzten Listener weiter.
    pub fn click(&self) {
        if let Some(listener) = &self.listener {
            listener.on_ground_overlay_click(self);
        }
    }

    /// Übernimmt die Eltern-Sichtbarkeit und löst das Overlay-Bild auf.
    pub async fn set_style(&mut self, registry: &StyleRegistry, parent_visibility: bool) {
        self.state.apply_parent_visibility(parent_visibility);

        let Some(href) = self.icon_href.as_deref() else {
            self.image = None;
            return;
        };
        self.image = resolve_image(registry, href).await;
        if self.image.is_none() {
            log::warn!(
                "Ground-Overlay '{}': Bild '{}' nicht verfuegbar",
                self.state.name,
                href
            );
        }
    }
}

impl Feature for GroundOverlay {
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
    }

    fn set_event_listener(&mut self, listener: SharedListener) {
        self.listener = Some(listener);
    }

    fn render(&self, sink: &mut dyn RenderSink) {
        if self.state.active {
            sink.draw_ground_overlay(self);
        }
    }
}
