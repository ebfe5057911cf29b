//! Geteilte Typen: Laufzeit-Optionen.

pub mod options;

pub use options::KmlOptions;
