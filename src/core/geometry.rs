//! Geographische Grundtypen: Koordinaten und Bounding-Boxen.

/// Geographische Koordinate in Grad (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatLng {
    /// Breitengrad
    pub lat: f64,
    /// Längengrad
    pub lng: f64,
}

impl LatLng {
    /// Erstellt eine neue Koordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Ausdehnung eines Ground-Overlays (`<LatLonBox>`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatLonBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    /// Drehung gegen den Uhrzeigersinn in Grad
    pub rotation: f64,
}

impl LatLonBox {
    /// Setzt eine Kante anhand des KML-Tag-Namens. Unbekannte Tags werden ignoriert.
    pub fn set_edge(&mut self, tag: &str, value: f64) -> bool {
        match tag {
            "north" => self.north = value,
            "south" => self.south = value,
            "east" => self.east = value,
            "west" => self.west = value,
            "rotation" => self.rotation = value,
            _ => return false,
        }
        true
    }
}
