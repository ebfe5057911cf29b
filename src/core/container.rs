//! Container (`<Document>`/`<Folder>`) mit geordneten Kind-Features.
//!
//! Container kaskadieren Sichtbarkeit, Style und Listener auf ihren
//! Teilbaum und bieten tiefenbegrenzte Strukturabfragen.

use super::feature::{
    Feature, FeatureNode, FeatureState, PropertyMap, RenderSink, SharedListener,
};
use super::ground_overlay::GroundOverlay;
use super::placemark::{Marker, Polyline};
use super::style::StyleRegistry;

/// Gruppierender Knoten im Feature-Baum.
///
/// Die Kind-Reihenfolge entspricht der Dokumentreihenfolge.
#[derive(Debug, Clone, Default)]
pub struct Container {
    state: FeatureState,
    children: Vec<FeatureNode>,
}

/// Anzahl der Features je Variante in einem Teilbaum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureCounts {
    pub containers: usize,
    pub markers: usize,
    pub polylines: usize,
    pub ground_overlays: usize,
}

impl Container {
    /// Erstellt einen leeren, aktiven Container
    pub fn new() -> Self {
        Self::default()
    }

    /// Erstellt einen leeren Container mit Namen
    pub fn with_name(name: impl Into<String>) -> Self {
        let mut container = Self::new();
        container.set_name(name);
        container
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.state.name = name.into();
    }

    pub fn state(&self) -> &FeatureState {
        &self.state
    }

    /// Kehrt den Aktiv-Zustand um (inklusive Kaskade)
    pub fn toggle_active(&mut self) {
        let active = !self.state.active;
        self.set_active(active);
    }

    /// Hängt ein Kind ans Ende der Liste an
    pub fn add_child(&mut self, child: impl Into<FeatureNode>) {
        self.children.push(child.into());
    }

    /// Alle direkten Kinder in Dokumentreihenfolge
    pub fn children(&self) -> &[FeatureNode] {
        &self.children
    }

    /// Direkte Kind-Container
    pub fn containers(&self) -> Vec<&Container> {
        self.children.iter().filter_map(FeatureNode::as_container).collect()
    }

    /// Direkte Kind-Container (mutierbar, z.B. für UI-Toggles)
    pub fn containers_mut(&mut self) -> Vec<&mut Container> {
        self.children
            .iter_mut()
            .filter_map(FeatureNode::as_container_mut)
            .collect()
    }

    fn has_containers(&self) -> bool {
        self.children
            .iter()
            .any(|child| matches!(child, FeatureNode::Container(_)))
    }

    /// Container aus einer bestimmten Tiefe des Baums.
    ///
    /// Tiefe 0 liefert `[self]`. Endet ein Ast vor der gewünschten Tiefe,
    /// wird sein tiefster Container geliefert statt einer leeren Liste.
    pub fn containers_at_depth(&self, depth: usize) -> Vec<&Container> {
        let mut result = Vec::new();
        self.collect_at_depth(depth, &mut result);
        result
    }

    fn collect_at_depth<'a>(&'a self, depth: usize, out: &mut Vec<&'a Container>) {
        if depth == 0 || !self.has_containers() {
            out.push(self);
            return;
        }
        for child in &self.children {
            if let FeatureNode::Container(container) = child {
                container.collect_at_depth(depth - 1, out);
            }
        }
    }

    /// Mutierbare Variante von [`Container::containers_at_depth`].
    pub fn containers_at_depth_mut(&mut self, depth: usize) -> Vec<&mut Container> {
        let mut result = Vec::new();
        self.collect_at_depth_mut(depth, &mut result);
        result
    }

    fn collect_at_depth_mut<'a>(&'a mut self, depth: usize, out: &mut Vec<&'a mut Container>) {
        if depth == 0 || !self.has_containers() {
            out.push(self);
            return;
        }
        for child in &mut self.children {
            if let FeatureNode::Container(container) = child {
                container.collect_at_depth_mut(depth - 1, out);
            }
        }
    }

    /// Direkte Kind-Marker
    pub fn markers(&self) -> Vec<&Marker> {
        self.children.iter().filter_map(FeatureNode::as_marker).collect()
    }

    /// Direkte Kind-Polylinien
    pub fn polylines(&self) -> Vec<&Polyline> {
        self.children.iter().filter_map(FeatureNode::as_polyline).collect()
    }

    /// Direkte Kind-Ground-Overlays
    pub fn ground_overlays(&self) -> Vec<&GroundOverlay> {
        self.children
            .iter()
            .filter_map(FeatureNode::as_ground_overlay)
            .collect()
    }

    /// Zählt alle Features im Teilbaum (ohne den Container selbst).
    pub fn feature_counts(&self) -> FeatureCounts {
        let mut counts = FeatureCounts::default();
        for child in &self.children {
            match child {
                FeatureNode::Container(c) => {
                    let nested = c.feature_counts();
                    counts.containers += 1 + nested.containers;
                    counts.markers += nested.markers;
                    counts.polylines += nested.polylines;
                    counts.ground_overlays += nested.ground_overlays;
                }
                FeatureNode::Marker(_) => counts.markers += 1,
                FeatureNode::Polyline(_) => counts.polylines += 1,
                FeatureNode::GroundOverlay(_) => counts.ground_overlays += 1,
            }
        }
        counts
    }

    /// Style-Pass in Pre-Order.
    ///
    /// Der Container setzt zuerst seinen eigenen Zustand; jedes Kind sieht
    /// danach den bereits aktualisierten Wert. Geschwister werden in
    /// Dokumentreihenfolge und strikt nacheinander besucht.
    pub async fn set_style(&mut self, registry: &StyleRegistry, parent_visibility: bool) {
        let active = self.state.apply_parent_visibility(parent_visibility);
        for child in &mut self.children {
            child.set_style(registry, active).await;
        }
    }
}

impl Feature for Container {
    fn name(&self) -> &str {
        &self.state.name
    }

    fn set_active(&mut self, active: bool) {
        self.state.active = active;
        for child in &mut self.children {
            child.set_active(active);
        }
    }

    fn is_active(&self) -> bool {
        self.state.active
    }

    fn set_properties(&mut self, properties: &PropertyMap) {
        self.state.apply_common_properties(properties);
    }

    fn set_event_listener(&mut self, listener: SharedListener) {
        for child in &mut self.children {
            child.set_event_listener(listener.clone());
        }
    }

    fn render(&self, sink: &mut dyn RenderSink) {
        if !self.state.active {
            return;
        }
        for child in &self.children {
            child.render(sink);
        }
    }
}

#[cfg(test)]
mod tests;
