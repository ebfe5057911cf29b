//! KML-Import: Token-Stream, Feld-Extraktion, Dokument-Builder, KMZ-Loader.
//!
//! Der Token-Stream reduziert das XML auf Tag- und Text-Events; die
//! Feld-Extraktion liest daraus `<ExtendedData>` und Koordinaten.

pub mod archive;
pub mod document;
pub mod error;
pub mod feature_fields;
pub mod token_stream;

pub use archive::{load_document, load_kmz, load_kmz_from_reader};
pub use document::{parse_kml_document, KmlDocument};
pub use error::{ErrorKind, KmlError, KmlResult};
pub use feature_fields::{is_scalar_property, parse_coordinates, parse_extended_data};
pub use token_stream::{EventKind, TokenStream};
