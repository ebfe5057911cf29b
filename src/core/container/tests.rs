use super::*;
use crate::core::feature::FeatureEventListener;
use crate::core::geometry::{LatLng, LatLonBox};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn marker(name: &str) -> Marker {
    let mut marker = Marker::new(LatLng::new(0.0, 0.0));
    marker.set_properties(&[("name".to_string(), name.to_string())].into());
    marker
}

fn polyline(name: &str) -> Polyline {
    let mut line = Polyline::new(vec![LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0)]);
    line.set_properties(&[("name".to_string(), name.to_string())].into());
    line
}

fn hidden(mut node: Marker) -> Marker {
    node.set_properties(&[("visibility".to_string(), "0".to_string())].into());
    node
}

/// A → B → C → (Marker)
fn chain() -> Container {
    let mut c = Container::with_name("C");
    c.add_child(marker("m"));
    let mut b = Container::with_name("B");
    b.add_child(c);
    let mut a = Container::with_name("A");
    a.add_child(b);
    a
}

/// Sammelt alle Aktiv-Flags im Teilbaum (ohne den Container selbst)
fn descendant_flags(container: &Container, out: &mut Vec<bool>) {
    for child in container.children() {
        out.push(child.is_active());
        if let Some(nested) = child.as_container() {
            descendant_flags(nested, out);
        }
    }
}

fn names(containers: &[&Container]) -> Vec<String> {
    containers.iter().map(|c| c.name().to_string()).collect()
}

#[derive(Default)]
struct RecordingSink(Vec<String>);

impl RenderSink for RecordingSink {
    fn draw_marker(&mut self, marker: &Marker) {
        self.0.push(format!("marker:{}", marker.name()));
    }
    fn draw_polyline(&mut self, polyline: &Polyline) {
        self.0.push(format!("line:{}", polyline.name()));
    }
    fn draw_ground_overlay(&mut self, overlay: &GroundOverlay) {
        self.0.push(format!("overlay:{}", overlay.name()));
    }
}

#[test]
fn test_set_active_cascades_to_all_descendants() {
    let mut root = chain();
    root.add_child(polyline("p"));

    root.set_active(false);
    let mut flags = Vec::new();
    descendant_flags(&root, &mut flags);
    assert!(!root.is_active());
    assert_eq!(flags.len(), 4);
    assert!(flags.iter().all(|f| !f));

    root.set_active(true);
    let mut flags = Vec::new();
    descendant_flags(&root, &mut flags);
    assert!(flags.iter().all(|f| *f));
}

#[test]
fn test_toggle_active() {
    let mut root = chain();
    root.toggle_active();
    assert!(!root.is_active());
    assert!(!root.containers()[0].is_active());
    root.toggle_active();
    assert!(root.containers()[0].is_active());
}

#[test]
fn test_containers_at_depth_returns_deepest_on_short_branch() {
    let root = chain();
    assert_eq!(names(&root.containers_at_depth(5)), vec!["C"]);
    assert_eq!(names(&root.containers_at_depth(0)), vec!["A"]);
    assert_eq!(names(&root.containers_at_depth(1)), vec!["B"]);
}

#[test]
fn test_containers_at_depth_concatenates_in_child_order() {
    // root → [X → [X1, X2], marker, Y]
    let mut x = Container::with_name("X");
    x.add_child(Container::with_name("X1"));
    x.add_child(Container::with_name("X2"));
    let mut root = Container::with_name("root");
    root.add_child(x);
    root.add_child(marker("m"));
    root.add_child(Container::with_name("Y"));

    assert_eq!(names(&root.containers()), vec!["X", "Y"]);
    assert_eq!(names(&root.containers_at_depth(1)), vec!["X", "Y"]);
    assert_eq!(names(&root.containers_at_depth(2)), vec!["X1", "X2", "Y"]);
}

#[test]
fn test_containers_at_depth_mut_allows_toggling_branch() {
    let mut root = chain();
    for container in root.containers_at_depth_mut(1) {
        container.set_active(false);
    }
    assert!(root.is_active());
    let b = root.containers()[0];
    assert!(!b.is_active());
    assert!(!b.containers()[0].markers()[0].is_active());
}

#[test]
fn test_typed_filters_preserve_insertion_order() {
    let mut root = Container::new();
    root.add_child(marker("X"));
    root.add_child(polyline("L1"));
    root.add_child(Container::with_name("F"));
    root.add_child(marker("Y"));
    root.add_child(GroundOverlay::new(LatLonBox::default(), None));
    root.add_child(polyline("L2"));
    root.add_child(marker("Z"));

    let markers: Vec<&str> = root.markers().iter().map(|m| m.name()).collect();
    let lines: Vec<&str> = root.polylines().iter().map(|p| p.name()).collect();
    assert_eq!(markers, vec!["X", "Y", "Z"]);
    assert_eq!(lines, vec!["L1", "L2"]);
    assert_eq!(root.ground_overlays().len(), 1);
    assert_eq!(root.containers().len(), 1);
    assert_eq!(root.children().len(), 7);
}

#[test]
fn test_typed_filters_are_not_recursive() {
    let root = chain();
    assert!(root.markers().is_empty());
    assert_eq!(root.feature_counts().markers, 1);
    assert_eq!(root.feature_counts().containers, 2);
}

#[test]
fn test_style_pass_with_hidden_root_hides_everything() {
    let mut root = chain();
    root.add_child(marker("visible-leaf"));
    let registry = StyleRegistry::new();

    pollster::block_on(root.set_style(&registry, false));

    assert!(!root.is_active());
    let mut flags = Vec::new();
    descendant_flags(&root, &mut flags);
    assert!(flags.iter().all(|f| !f));
}

#[test]
fn test_style_pass_respects_local_visibility() {
    let mut folder = Container::with_name("F");
    folder.set_properties(&[("visibility".to_string(), "0".to_string())].into());
    folder.add_child(marker("in-hidden-folder"));

    let mut root = Container::new();
    root.add_child(hidden(marker("hidden")));
    root.add_child(marker("shown"));
    root.add_child(folder);

    pollster::block_on(root.set_style(&StyleRegistry::new(), true));

    let flags: Vec<bool> = root.markers().iter().map(|m| m.is_active()).collect();
    assert_eq!(flags, vec![false, true]);
    let folder = root.containers()[0];
    assert!(!folder.is_active());
    assert!(!folder.markers()[0].is_active());
}

#[test]
fn test_render_skips_inactive_subtrees() {
    let mut inner = Container::with_name("inner");
    inner.add_child(marker("deep"));
    let mut root = Container::new();
    root.add_child(marker("a"));
    root.add_child(inner);
    root.add_child(hidden(marker("b")));
    root.add_child(polyline("c"));

    let mut sink = RecordingSink::default();
    root.render(&mut sink);
    assert_eq!(sink.0, vec!["marker:a", "marker:deep", "line:c"]);

    root.containers_mut()[0].set_active(false);
    let mut sink = RecordingSink::default();
    root.render(&mut sink);
    assert_eq!(sink.0, vec!["marker:a", "line:c"]);

    root.set_active(false);
    let mut sink = RecordingSink::default();
    root.render(&mut sink);
    assert!(sink.0.is_empty());
}

#[test]
fn test_event_listener_reaches_nested_leaves() {
    #[derive(Default)]
    struct Counter(AtomicUsize);
    impl FeatureEventListener for Counter {
        fn on_marker_click(&self, _marker: &Marker) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let counter = Arc::new(Counter::default());
    let mut root = chain();
    root.add_child(marker("top"));
    root.set_event_listener(counter.clone());

    root.markers()[0].click();
    root.containers_at_depth(5)[0].markers()[0].click();
    assert_eq!(counter.0.load(Ordering::SeqCst), 2);
}
