//! Pull-Cursor über den Tag-Stream eines KML-Dokuments.
//!
//! Kapselt `quick_xml::Reader` und reduziert dessen Events auf die fünf
//! Arten, die der KML-Kern braucht. Kommentare, Deklarationen, PIs und
//! Doctype werden übersprungen; CDATA und Entity-Referenzen zählen als Text.

use super::error::{KmlError, KmlResult};
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Art des aktuellen Events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Vor dem ersten `advance()`
    DocumentStart,
    /// Öffnender Tag (auch die erste Hälfte eines leeren Elements)
    TagOpen,
    /// Schließender Tag
    TagClose,
    /// Textinhalt
    Text,
    /// Ende der Eingabe
    DocumentEnd,
}

/// Cursor über ein KML-Dokument.
pub struct TokenStream<'a> {
    reader: Reader<&'a [u8]>,
    kind: EventKind,
    /// Lokaler Tag-Name (ohne Namespace-Präfix) bei TagOpen/TagClose
    tag_name: Option<String>,
    /// Start-Tag des aktuellen TagOpen-Events für Attribut-Abfragen
    start: Option<BytesStart<'a>>,
    /// Dekodierter Text des aktuellen Text-Events
    text: Option<String>,
}

impl<'a> TokenStream<'a> {
    /// Erstellt einen Cursor über den Markup-Text. Der Cursor steht auf
    /// [`EventKind::DocumentStart`].
    pub fn new(markup: &'a str) -> Self {
        let mut reader = Reader::from_str(markup);
        // <Data name="a"/> liefert so TagOpen + TagClose wie ein volles Element
        reader.config_mut().expand_empty_elements = true;

        Self {
            reader,
            kind: EventKind::DocumentStart,
            tag_name: None,
            start: None,
            text: None,
        }
    }

    /// Art des aktuellen Events.
    pub fn current_kind(&self) -> EventKind {
        self.kind
    }

    /// Lokaler Tag-Name; nur bei TagOpen/TagClose gesetzt.
    pub fn current_tag_name(&self) -> Option<&str> {
        self.tag_name.as_deref()
    }

    /// Prüft ob das aktuelle Event ein öffnender Tag mit diesem Namen ist.
    pub fn is_open(&self, tag: &str) -> bool {
        self.kind == EventKind::TagOpen && self.tag_name.as_deref() == Some(tag)
    }

    /// Prüft ob das aktuelle Event ein schließender Tag mit diesem Namen ist.
    pub fn is_close(&self, tag: &str) -> bool {
        self.kind == EventKind::TagClose && self.tag_name.as_deref() == Some(tag)
    }

    /// Liest ein Attribut des aktuellen öffnenden Tags.
    ///
    /// Gibt `None` zurück, wenn der Cursor nicht auf `<tag_local_name ...>`
    /// steht oder das Attribut fehlt. Attribut-Namen werden ohne Präfix
    /// verglichen.
    pub fn attribute_value(
        &self,
        tag_local_name: &str,
        attr_name: &str,
    ) -> KmlResult<Option<String>> {
        if !self.is_open(tag_local_name) {
            return Ok(None);
        }
        let Some(start) = self.start.as_ref() else {
            return Ok(None);
        };

        for attr in start.attributes().with_checks(false) {
            let attr = attr?;
            if attr.key.local_name().as_ref() == attr_name.as_bytes() {
                let value = attr.unescape_value().map_err(quick_xml::Error::from)?;
                return Ok(Some(value.into_owned()));
            }
        }
        Ok(None)
    }

    /// Sammelt allen Text bis zum nächsten schließenden Tag.
    ///
    /// Der schließende Tag wird dabei konsumiert und ist danach das aktuelle
    /// Event; erst das nächste `advance()` geht darüber hinaus.
    ///
    /// Verschachteltes Markup (`<description>a <b>b</b> c</description>`)
    /// endet beim ersten inneren schließenden Tag; der Rest des Werts geht
    /// verloren. Solche Werte müssen in CDATA stehen.
    pub fn read_text_until_tag_close(&mut self) -> KmlResult<String> {
        let opened = self.tag_name.clone().unwrap_or_default();
        let mut text = String::new();

        loop {
            match self.advance()? {
                EventKind::Text => {
                    if let Some(chunk) = self.text.as_deref() {
                        text.push_str(chunk);
                    }
                }
                EventKind::TagClose => return Ok(text),
                EventKind::DocumentEnd => return Err(KmlError::Truncated(opened)),
                EventKind::TagOpen => log::debug!(
                    "Markup <{}> in <{}>: Text wird beim ersten schliessenden Tag abgeschnitten",
                    self.tag_name.as_deref().unwrap_or_default(),
                    opened
                ),
                EventKind::DocumentStart => {}
            }
        }
    }

    /// Überspringt das Element, auf dessen öffnendem Tag der Cursor steht,
    /// inklusive aller Kinder. Danach ist der passende schließende Tag das
    /// aktuelle Event.
    pub fn skip_element(&mut self) -> KmlResult<()> {
        if self.kind != EventKind::TagOpen {
            return Ok(());
        }
        let opened = self.tag_name.clone().unwrap_or_default();
        let mut depth = 1usize;

        while depth > 0 {
            match self.advance()? {
                EventKind::TagOpen => depth += 1,
                EventKind::TagClose => depth -= 1,
                EventKind::DocumentEnd => return Err(KmlError::Truncated(opened)),
                EventKind::Text | EventKind::DocumentStart => {}
            }
        }
        Ok(())
    }

    /// Geht zum nächsten relevanten Event weiter.
    pub fn advance(&mut self) -> KmlResult<EventKind> {
        self.tag_name = None;
        self.start = None;
        self.text = None;

        if self.kind == EventKind::DocumentEnd {
            return Ok(self.kind);
        }

        let decoder = self.reader.decoder();
        loop {
            let event = self.reader.read_event()?;
            self.kind = match event {
                Event::Start(e) => {
                    self.tag_name = Some(decoder.decode(e.local_name().as_ref())?.into_owned());
                    self.start = Some(e);
                    EventKind::TagOpen
                }
                Event::End(e) => {
                    self.tag_name = Some(decoder.decode(e.local_name().as_ref())?.into_owned());
                    EventKind::TagClose
                }
                Event::Text(e) => {
                    self.text = Some(e.xml_content()?.into_owned());
                    EventKind::Text
                }
                Event::CData(e) => {
                    self.text = Some(e.decode()?.into_owned());
                    EventKind::Text
                }
                Event::GeneralRef(e) => {
                    let resolved = match e.resolve_char_ref()? {
                        Some(ch) => ch.to_string(),
                        None => {
                            let name = e.decode()?;
                            match resolve_predefined_entity(&name) {
                                Some(s) => s.to_string(),
                                // Unbekannte Entities bleiben wörtlich erhalten
                                None => format!("&{};", name),
                            }
                        }
                    };
                    self.text = Some(resolved);
                    EventKind::Text
                }
                Event::Eof => EventKind::DocumentEnd,
                _ => continue,
            };
            return Ok(self.kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_kinds(markup: &str) -> Vec<(EventKind, Option<String>)> {
        let mut stream = TokenStream::new(markup);
        let mut out = Vec::new();
        loop {
            let kind = stream.advance().unwrap();
            out.push((kind, stream.current_tag_name().map(str::to_string)));
            if kind == EventKind::DocumentEnd {
                break;
            }
        }
        out
    }

    #[test]
    fn test_starts_at_document_start() {
        let stream = TokenStream::new("<a/>");
        assert_eq!(stream.current_kind(), EventKind::DocumentStart);
        assert_eq!(stream.current_tag_name(), None);
    }

    #[test]
    fn test_empty_element_expands_to_open_and_close() {
        let kinds = collect_kinds(r#"<?xml version="1.0"?><!-- x --><Data name="a"/>"#);
        assert_eq!(
            kinds,
            vec![
                (EventKind::TagOpen, Some("Data".to_string())),
                (EventKind::TagClose, Some("Data".to_string())),
                (EventKind::DocumentEnd, None),
            ]
        );
    }

    #[test]
    fn test_namespace_prefix_is_stripped() {
        let mut stream = TokenStream::new(r#"<kml:Placemark kml:id="p1"></kml:Placemark>"#);
        stream.advance().unwrap();
        assert_eq!(stream.current_tag_name(), Some("Placemark"));
        assert_eq!(
            stream.attribute_value("Placemark", "id").unwrap().as_deref(),
            Some("p1")
        );
    }

    #[test]
    fn test_attribute_value_requires_matching_open_tag() {
        let mut stream = TokenStream::new(r#"<Data name="a &amp; b"></Data>"#);
        stream.advance().unwrap();
        assert_eq!(stream.attribute_value("Style", "name").unwrap(), None);
        assert_eq!(stream.attribute_value("Data", "missing").unwrap(), None);
        assert_eq!(
            stream.attribute_value("Data", "name").unwrap().as_deref(),
            Some("a & b")
        );

        stream.advance().unwrap();
        assert_eq!(stream.attribute_value("Data", "name").unwrap(), None);
    }

    #[test]
    fn test_read_text_consumes_close_tag() {
        let mut stream =
            TokenStream::new("<value>Tom &amp; <![CDATA[Jerry]]>&#33;</value><next/>");
        stream.advance().unwrap();
        let text = stream.read_text_until_tag_close().unwrap();
        assert_eq!(text, "Tom & Jerry!");
        assert!(stream.is_close("value"));

        stream.advance().unwrap();
        assert!(stream.is_open("next"));
    }

    #[test]
    fn test_read_text_stops_at_first_nested_close_tag() {
        let mut stream = TokenStream::new("<description>Hallo <b>fett</b> Welt</description>");
        stream.advance().unwrap();
        let text = stream.read_text_until_tag_close().unwrap();
        assert_eq!(text, "Hallo fett");
        assert!(stream.is_close("b"));

        stream.advance().unwrap();
        assert_eq!(stream.current_kind(), EventKind::Text);
        stream.advance().unwrap();
        assert!(stream.is_close("description"));
    }

    #[test]
    fn test_read_text_fails_on_truncated_stream() {
        let mut stream = TokenStream::new("<value>abc");
        stream.advance().unwrap();
        let err = stream.read_text_until_tag_close().unwrap_err();
        assert_eq!(err.kind(), crate::xml::error::ErrorKind::Stream);
    }

    #[test]
    fn test_skip_element_jumps_over_children() {
        let mut stream = TokenStream::new("<a><b><c>x</c></b><b/></a><d/>");
        stream.advance().unwrap();
        stream.skip_element().unwrap();
        assert!(stream.is_close("a"));
        stream.advance().unwrap();
        assert!(stream.is_open("d"));
    }

    #[test]
    fn test_mismatched_close_tag_is_stream_error() {
        let mut stream = TokenStream::new("<a><b></a>");
        let mut result = Ok(EventKind::DocumentStart);
        for _ in 0..4 {
            result = stream.advance();
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(KmlError::Stream(_))));
    }
}
