//! Core-Domänentypen: Feature-Baum, Geometrie, Styles.

pub mod container;
pub mod extended_data;
/// Feature-Vertrag und Knoten-Enum
///
/// Dieses Modul definiert:
/// - Feature: gemeinsame synchrone Fähigkeiten aller Knoten
/// - FeatureNode: geschlossene Menge der Baum-Varianten
/// - RenderSink / FeatureEventListener: Schnittstellen nach außen
pub mod feature;
pub mod geometry;
pub mod ground_overlay;
pub mod placemark;
pub mod style;

pub use container::{Container, FeatureCounts};
pub use extended_data::ExtendedData;
pub use feature::{
    Feature, FeatureEventListener, FeatureNode, FeatureState, PropertyMap, RenderSink,
    SharedListener,
};
pub use geometry::{LatLng, LatLonBox};
pub use ground_overlay::GroundOverlay;
pub use placemark::{Marker, Polyline};
pub use style::{KmlColor, KmlStyle, KmlStyleMap, StyleRegistry};
