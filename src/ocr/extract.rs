use anyhow::Result;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

/// Signed decimal with a required fractional part: `-98.765`, `+12.0`
const COORDINATE_VALUE: &str = r"([-+]?\d+\.\d+)";

/// Unsigned decimal with optional fractional part: `30`, `0.9`
const DECIMAL_VALUE: &str = r"(\d+(?:\.\d+)?)";

/// Unsigned integer: `14`
const INTEGER_VALUE: &str = r"(\d+)";

/// Any run of colons or whitespace between label and value, possibly empty.
const SEPARATOR: &str = r"[:\s]*";

/// The telemetry values read off the OSD.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetryField {
    Lat,
    Lon,
    Alt,
    Bat,
    Sats,
    Hdop,
}

impl TelemetryField {
    pub const ALL: [TelemetryField; 6] = [
        TelemetryField::Lat,
        TelemetryField::Lon,
        TelemetryField::Alt,
        TelemetryField::Bat,
        TelemetryField::Sats,
        TelemetryField::Hdop,
    ];

    /// Key used in the output record.
    pub fn as_str(self) -> &'static str {
        match self {
            TelemetryField::Lat => "lat",
            TelemetryField::Lon => "lon",
            TelemetryField::Alt => "alt",
            TelemetryField::Bat => "bat",
            TelemetryField::Sats => "sats",
            TelemetryField::Hdop => "hdop",
        }
    }

    /// Label as printed on the OSD.
    fn label(self) -> &'static str {
        match self {
            TelemetryField::Lat => "Lat",
            TelemetryField::Lon => "Lon",
            TelemetryField::Alt => "Alt",
            TelemetryField::Bat => "Bat",
            TelemetryField::Sats => "Sats",
            TelemetryField::Hdop => "HDOP",
        }
    }

    fn value_pattern(self) -> &'static str {
        match self {
            TelemetryField::Lat | TelemetryField::Lon => COORDINATE_VALUE,
            TelemetryField::Alt | TelemetryField::Bat | TelemetryField::Hdop => DECIMAL_VALUE,
            TelemetryField::Sats => INTEGER_VALUE,
        }
    }

    fn pattern(self) -> String {
        format!("(?i){}{}{}", self.label(), SEPARATOR, self.value_pattern())
    }
}

/// Field values recognized in one frame.
///
/// Only fields whose pattern matched are present. Values are the matched
/// text, unconverted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TelemetryRecord {
    fields: BTreeMap<TelemetryField, String>,
}

impl TelemetryRecord {
    pub fn get(&self, field: TelemetryField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: TelemetryField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TelemetryField, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn insert(&mut self, field: TelemetryField, value: &str) {
        self.fields.insert(field, value.to_string());
    }
}

/// Compiled field patterns.
///
/// Each field is searched independently anywhere in the text and the first
/// match wins. A label embedded in another word (e.g. "flat: 2.5") still
/// matches, so noisy OCR can produce false positives.
#[derive(Debug, Clone)]
pub struct TelemetryParser {
    patterns: Vec<(TelemetryField, Regex)>,
}

impl TelemetryParser {
    pub fn new() -> Result<Self> {
        let patterns = TelemetryField::ALL
            .iter()
            .map(|&field| -> Result<(TelemetryField, Regex)> {
                Ok((field, Regex::new(&field.pattern())?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Extracts every field that matches in `text`.
    pub fn parse(&self, text: &str) -> TelemetryRecord {
        let mut record = TelemetryRecord::default();

        for (field, regex) in &self.patterns {
            if let Some(value) = regex.captures(text).and_then(|caps| caps.get(1)) {
                record.insert(*field, value.as_str());
            }
        }

        record
    }
}

/// Compiles the patterns and parses `text` in one step.
pub fn parse_telemetry(text: &str) -> Result<TelemetryRecord> {
    Ok(TelemetryParser::new()?.parse(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> TelemetryRecord {
        parse_telemetry(text).unwrap()
    }

    #[test]
    fn test_parse_full_line() {
        let record = parse("Lat:12.345 Lon:-98.765 Alt:30.5 Bat:87 Sats:14 HDOP:0.9");

        assert_eq!(record.len(), 6);
        assert_eq!(record.get(TelemetryField::Lat), Some("12.345"));
        assert_eq!(record.get(TelemetryField::Lon), Some("-98.765"));
        assert_eq!(record.get(TelemetryField::Alt), Some("30.5"));
        assert_eq!(record.get(TelemetryField::Bat), Some("87"));
        assert_eq!(record.get(TelemetryField::Sats), Some("14"));
        assert_eq!(record.get(TelemetryField::Hdop), Some("0.9"));
    }

    #[test]
    fn test_missing_field_is_omitted() {
        let record = parse("Lat:12.345 Lon:-98.765 Alt:30.5 Sats:14 HDOP:0.9");

        assert_eq!(record.len(), 5);
        assert!(!record.contains(TelemetryField::Bat));
        assert_eq!(record.get(TelemetryField::Bat), None);
    }

    #[test]
    fn test_case_insensitive() {
        let lower = parse("lat: 5.0");
        let upper = parse("LAT:5.0");

        assert_eq!(lower.get(TelemetryField::Lat), Some("5.0"));
        assert_eq!(lower, upper);
        assert_eq!(parse("hdop 1.2").get(TelemetryField::Hdop), Some("1.2"));
    }

    #[test]
    fn test_empty_and_garbled_text() {
        assert!(parse("").is_empty());
        assert!(parse("   ").is_empty());
        assert!(parse("L@t 12,3 B4t ?? 5ats x").is_empty());
    }

    #[test]
    fn test_separators() {
        assert_eq!(parse("Alt30").get(TelemetryField::Alt), Some("30"));
        assert_eq!(parse("Alt : \t 30").get(TelemetryField::Alt), Some("30"));
        assert_eq!(parse("Alt::30").get(TelemetryField::Alt), Some("30"));
        // Other punctuation is not a separator
        assert_eq!(parse("Alt=30").get(TelemetryField::Alt), None);
        // Separators may span the gap between two OCR outputs
        assert_eq!(parse("Sats: \n7").get(TelemetryField::Sats), Some("7"));
    }

    #[test]
    fn test_coordinates_require_fraction() {
        let record = parse("Lat:12 Lon:+45.25");
        assert_eq!(record.get(TelemetryField::Lat), None);
        assert_eq!(record.get(TelemetryField::Lon), Some("+45.25"));
    }

    #[test]
    fn test_unsigned_fields_ignore_sign() {
        // A minus sign is not a separator, so the label does not match
        assert_eq!(parse("Alt:-5").get(TelemetryField::Alt), None);
        assert_eq!(parse("Alt: 12.").get(TelemetryField::Alt), Some("12"));
    }

    #[test]
    fn test_sats_integer_only() {
        assert_eq!(parse("Sats:14.7").get(TelemetryField::Sats), Some("14"));
    }

    #[test]
    fn test_first_match_wins() {
        let record = parse("Bat:87 Bat:12");
        assert_eq!(record.get(TelemetryField::Bat), Some("87"));
    }

    #[test]
    fn test_label_inside_other_word_matches() {
        // Fields are matched independently: "flat" contains "lat"
        let record = parse("flat: 2.5 combat 40");
        assert_eq!(record.get(TelemetryField::Lat), Some("2.5"));
        assert_eq!(record.get(TelemetryField::Bat), Some("40"));
    }

    #[test]
    fn test_split_across_top_and_bottom() {
        let record = parse("Lat:1.5 Lon:2.5 Sats:9 HDOP:1.1");
        assert_eq!(record.len(), 4);
        assert_eq!(record.get(TelemetryField::Sats), Some("9"));
    }

    #[test]
    fn test_repeated_parse_is_stable() {
        let parser = TelemetryParser::new().unwrap();
        let text = "Lat:12.345 Alt:30.5";
        assert_eq!(parser.parse(text), parser.parse(text));
    }

    #[test]
    fn test_serializes_with_lowercase_keys() {
        let record = parse("HDOP:0.9 Lat:12.345 Sats:14");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"lat":"12.345","sats":"14","hdop":"0.9"}"#);
    }

    #[test]
    fn test_iter_only_yields_known_fields() {
        let record = parse("Lat:1.0 Lon:2.0 Speed:30 Alt:4");
        let keys: Vec<&str> = record.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["lat", "lon", "alt"]);
    }
}
