//! KML Feature Tree Library.
//! Liest KML/KMZ-Dokumente in einen Feature-Baum mit Sichtbarkeits- und
//! Style-Kaskade.

pub mod core;
pub mod shared;
pub mod xml;

pub use core::{
    Container, ExtendedData, Feature, FeatureEventListener, FeatureNode, GroundOverlay, LatLng,
    LatLonBox, Marker, Polyline, PropertyMap, RenderSink, StyleRegistry,
};
pub use shared::KmlOptions;
pub use xml::{load_document, parse_kml_document, KmlDocument, KmlError};
