//! Typisierte Fehler des KML-Kerns (Token-Stream und Feld-Extraktion).

use std::num::ParseFloatError;

/// Grobe Einordnung eines [`KmlError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Stream kaputt oder abgeschnitten; die Cursor-Position ist unzuverlässig.
    Stream,
    /// Einzelner Wert fehlerhaft; der Aufrufer entscheidet über Skip oder Abbruch.
    Format,
}

/// Fehler beim Lesen von KML-Markup.
#[derive(Debug, thiserror::Error)]
pub enum KmlError {
    /// Fehlerhaftes XML aus dem Reader
    #[error("XML-Stream fehlerhaft: {0}")]
    Stream(#[from] quick_xml::Error),

    /// Dokumentende innerhalb eines noch offenen Blocks
    #[error("XML-Stream endet unerwartet innerhalb von <{0}>")]
    Truncated(String),

    /// Koordinatenzeile mit weniger als zwei Werten
    #[error("Koordinate in Zeile {line} hat weniger als zwei Werte: '{content}'")]
    MissingCoordinate {
        /// 1-basierte Zeilennummer innerhalb des Koordinatenblocks
        line: usize,
        /// Inhalt der Zeile (gekürzt)
        content: String,
    },

    /// Koordinatenwert ist keine Gleitkommazahl
    #[error("Koordinatenwert '{token}' in Zeile {line} ist keine gueltige Zahl")]
    InvalidNumber {
        /// 1-basierte Zeilennummer innerhalb des Koordinatenblocks
        line: usize,
        /// Fehlerhafter Token (gekürzt)
        token: String,
        #[source]
        source: ParseFloatError,
    },
}

impl KmlError {
    /// Ordnet den Fehler als Stream- oder Formatfehler ein.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Stream(_) | Self::Truncated(_) => ErrorKind::Stream,
            Self::MissingCoordinate { .. } | Self::InvalidNumber { .. } => ErrorKind::Format,
        }
    }

    pub fn is_format_error(&self) -> bool {
        self.kind() == ErrorKind::Format
    }
}

impl From<quick_xml::encoding::EncodingError> for KmlError {
    fn from(err: quick_xml::encoding::EncodingError) -> Self {
        Self::Stream(err.into())
    }
}

impl From<quick_xml::events::attributes::AttrError> for KmlError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::Stream(err.into())
    }
}

/// Ergebnis-Alias für den KML-Kern.
pub type KmlResult<T> = Result<T, KmlError>;

/// Kürzt einen String für Fehlermeldungen auf max. 40 Zeichen.
pub(crate) fn truncate_for_error(s: &str) -> String {
    s.chars().take(40).collect()
}
