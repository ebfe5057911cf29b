//! Extraktion strukturierter Felder aus dem Tag-Stream:
//! `<ExtendedData>`-Blöcke, Koordinatenlisten und die Einordnung skalarer
//! Property-Tags.

use super::error::{truncate_for_error, KmlError, KmlResult};
use super::token_stream::{EventKind, TokenStream};
use crate::core::{ExtendedData, LatLng};
use regex::Regex;
use std::sync::LazyLock;

pub const EXTENDED_DATA_TAG: &str = "ExtendedData";
pub const DATA_TAG: &str = "Data";
pub const DISPLAY_NAME_TAG: &str = "displayName";
pub const VALUE_TAG: &str = "value";
pub const NAME_ATTR: &str = "name";

/// Tags, deren Inhalt ein einfacher Skalarwert ist.
pub const SCALAR_PROPERTY_TAGS: &[&str] = &[
    "name",
    "description",
    "drawOrder",
    "visibility",
    "address",
    "phoneNumber",
    "styleUrl",
    "tessellate",
];

/// Trennzeichen innerhalb eines Koordinaten-Tupels (`lng,lat[,alt]`)
const LAT_LNG_ALT_SEPARATOR: char = ',';
const LONGITUDE_INDEX: usize = 0;
const LATITUDE_INDEX: usize = 1;
/// Mehr Werte pro Zeile deuten auf mehrere Tupel ohne Zeilenumbruch hin
const MAX_TUPLE_VALUES: usize = 3;

static PROPERTY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = SCALAR_PROPERTY_TAGS.join("|");
    Regex::new(&format!("^(?:{alternatives})$")).expect("Property-Pattern ist gueltig")
});

/// Prüft ob ein Tag eine skalare Property ist (statt eines Strukturblocks).
pub fn is_scalar_property(tag: &str) -> bool {
    PROPERTY_PATTERN.is_match(tag)
}

/// Liest einen `<ExtendedData>`-Block.
///
/// Der Cursor muss auf oder vor dem öffnenden `<ExtendedData>` stehen und
/// steht danach direkt hinter `</ExtendedData>`. Ein Eintrag wird erst beim
/// Lesen von `<value>` übernommen; ein unvollständiger letzter Eintrag wird
/// verworfen.
pub fn parse_extended_data(stream: &mut TokenStream<'_>) -> KmlResult<Vec<ExtendedData>> {
    let mut records = Vec::new();
    let mut current = ExtendedData::default();

    while !stream.is_close(EXTENDED_DATA_TAG) {
        match stream.current_kind() {
            EventKind::TagOpen => {
                let tag = stream.current_tag_name().unwrap_or_default().to_string();
                match tag.as_str() {
                    DATA_TAG => {
                        current.name = stream
                            .attribute_value(DATA_TAG, NAME_ATTR)?
                            .unwrap_or_default();
                    }
                    DISPLAY_NAME_TAG => {
                        current.display_name = stream.read_text_until_tag_close()?;
                    }
                    VALUE_TAG => {
                        current.value = stream.read_text_until_tag_close()?;
                        records.push(std::mem::take(&mut current));
                    }
                    _ => {}
                }
            }
            EventKind::DocumentEnd => {
                return Err(KmlError::Truncated(EXTENDED_DATA_TAG.to_string()));
            }
            EventKind::DocumentStart | EventKind::TagClose | EventKind::Text => {}
        }
        stream.advance()?;
    }

    if !current.name.is_empty() || !current.display_name.is_empty() {
        log::debug!(
            "Unvollstaendiger ExtendedData-Eintrag '{}' ohne <value> verworfen",
            current.name
        );
    }

    stream.advance()?;
    Ok(records)
}

/// Parst den Inhalt eines `<coordinates>`-Blocks.
///
/// Eine Zeile pro Punkt, Tupel `lng,lat[,alt]`. Die Reihenfolge der Zeilen
/// bleibt erhalten, die Höhe wird ignoriert. Mehrere Tupel in einer Zeile
/// (nur durch Leerzeichen getrennt) ergeben nur den ersten Punkt.
pub fn parse_coordinates(text: &str) -> KmlResult<Vec<LatLng>> {
    text.trim()
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| parse_coordinate_line(index + 1, line))
        .collect()
}

fn parse_coordinate_line(line_number: usize, line: &str) -> KmlResult<LatLng> {
    let tokens: Vec<&str> = line.split(LAT_LNG_ALT_SEPARATOR).map(str::trim).collect();
    if tokens.len() <= LATITUDE_INDEX {
        return Err(KmlError::MissingCoordinate {
            line: line_number,
            content: truncate_for_error(line.trim()),
        });
    }

    if tokens.len() > MAX_TUPLE_VALUES {
        log::debug!(
            "Koordinatenzeile {} hat {} Werte, nur der erste Punkt wird gelesen: '{}'",
            line_number,
            tokens.len(),
            truncate_for_error(line.trim())
        );
    }

    let lng = parse_number(line_number, tokens[LONGITUDE_INDEX])?;
    let lat = parse_number(line_number, tokens[LATITUDE_INDEX])?;
    Ok(LatLng::new(lat, lng))
}

fn parse_number(line_number: usize, token: &str) -> KmlResult<f64> {
    token
        .parse::<f64>()
        .map_err(|source| KmlError::InvalidNumber {
            line: line_number,
            token: truncate_for_error(token),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::error::ErrorKind;
    use approx::assert_relative_eq;

    fn extended_data(markup: &str) -> KmlResult<Vec<ExtendedData>> {
        let mut stream = TokenStream::new(markup);
        parse_extended_data(&mut stream)
    }

    #[test]
    fn test_extended_data_records_in_document_order() {
        let records = extended_data(
            r#"<ExtendedData>
                <Data name="holeNumber"><displayName>Hole</displayName><value>1</value></Data>
                <Data name="holePar"><value>4</value></Data>
            </ExtendedData>"#,
        )
        .unwrap();

        assert_eq!(
            records,
            vec![
                ExtendedData::new("holeNumber", "Hole", "1"),
                ExtendedData::new("holePar", "", "4"),
            ]
        );
    }

    #[test]
    fn test_empty_block_yields_no_records() {
        assert!(extended_data("<ExtendedData></ExtendedData>").unwrap().is_empty());
        assert!(extended_data("<ExtendedData/>").unwrap().is_empty());
    }

    #[test]
    fn test_trailing_record_without_value_is_dropped() {
        let records = extended_data(
            r#"<ExtendedData><Data name="a"><displayName>A</displayName></Data></ExtendedData>"#,
        )
        .unwrap();
        assert!(records.is_empty());

        let records = extended_data(
            r#"<ExtendedData>
                <Data name="a"><value>1</value></Data>
                <Data name="b"><displayName>B</displayName></Data>
            </ExtendedData>"#,
        )
        .unwrap();
        assert_eq!(records, vec![ExtendedData::new("a", "", "1")]);
    }

    #[test]
    fn test_cursor_ends_just_past_block() {
        let mut stream = TokenStream::new(
            r#"<Placemark><ExtendedData><Data name="x"><value>1</value></Data></ExtendedData><Point/></Placemark>"#,
        );
        stream.advance().unwrap();
        stream.advance().unwrap();
        assert!(stream.is_open(EXTENDED_DATA_TAG));

        let records = parse_extended_data(&mut stream).unwrap();
        assert_eq!(records.len(), 1);
        assert!(stream.is_open("Point"));
    }

    #[test]
    fn test_truncated_block_is_stream_error() {
        let err = extended_data(r#"<ExtendedData><Data name="a"><value>1</value></Data>"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Stream);
    }

    #[test]
    fn test_parse_coordinates_preserves_order_and_ignores_altitude() {
        let points = parse_coordinates("-122.1,37.4,0\n-122.2,37.5,0").unwrap();
        assert_eq!(points.len(), 2);
        assert_relative_eq!(points[0].lat, 37.4);
        assert_relative_eq!(points[0].lng, -122.1);
        assert_relative_eq!(points[1].lat, 37.5);
        assert_relative_eq!(points[1].lng, -122.2);
    }

    #[test]
    fn test_parse_coordinates_trims_and_skips_blank_lines() {
        let points = parse_coordinates("\n   8.5, 47.3\r\n\n   9.0,48.0,120 \n  ").unwrap();
        assert_eq!(points, vec![LatLng::new(47.3, 8.5), LatLng::new(48.0, 9.0)]);
        assert!(parse_coordinates("   ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_coordinates_keeps_first_tuple_of_space_separated_line() {
        let points = parse_coordinates("-122.1,37.4,0 -122.2,37.5,0").unwrap();
        assert_eq!(points, vec![LatLng::new(37.4, -122.1)]);
    }

    #[test]
    fn test_parse_coordinates_single_token_fails() {
        let err = parse_coordinates("-122.1").unwrap_err();
        assert!(err.is_format_error());
        assert!(matches!(err, KmlError::MissingCoordinate { line: 1, .. }));
    }

    #[test]
    fn test_parse_coordinates_non_numeric_fails() {
        let err = parse_coordinates("1,2\nabc,2").unwrap_err();
        assert!(matches!(err, KmlError::InvalidNumber { line: 2, .. }));
        assert!(parse_coordinates("-122.1,").unwrap_err().is_format_error());
    }

    #[test]
    fn test_scalar_property_classification() {
        for tag in SCALAR_PROPERTY_TAGS {
            assert!(is_scalar_property(tag), "{tag} sollte skalar sein");
        }
        assert!(!is_scalar_property("ExtendedData"));
        assert!(!is_scalar_property("displayName"));
        assert!(!is_scalar_property("Point"));
        assert!(!is_scalar_property("names"));
    }
}
