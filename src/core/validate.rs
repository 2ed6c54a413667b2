//! Validation of instrument options and identity computation for meters and
//! instruments, following the OpenTelemetry duplicate-registration rules.

use crate::core::{MetricError, Result};
use crate::instruments::InstrumentKind;
use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Maximum length of an instrument name in bytes.
pub const INSTRUMENT_NAME_MAX_LENGTH: usize = 255;
/// Maximum length of an instrument unit in bytes.
pub const INSTRUMENT_UNIT_MAX_LENGTH: usize = 63;
/// Maximum length of an instrument description in bytes.
pub const INSTRUMENT_DESCRIPTION_MAX_LENGTH: usize = 1023;

/// Characters allowed in instrument names besides ASCII alphanumerics.
pub const INSTRUMENT_NAME_ALLOWED_CHARS: [char; 4] = ['_', '-', '.', '/'];

/// Default explicit bucket boundaries for histograms.
pub const DEFAULT_HISTOGRAM_BOUNDARIES: [f64; 15] = [
    0.0, 5.0, 10.0, 25.0, 50.0, 75.0, 100.0, 250.0, 500.0, 750.0, 1000.0, 2500.0, 5000.0, 7500.0,
    10000.0,
];

/// Validates instrument name, unit, and description.
///
/// Name: 1-255 bytes, first character ASCII alphabetic, remainder ASCII
/// alphanumeric or one of `_ - . /`. Unit: at most 63 bytes, ASCII only.
/// Description: at most 1023 bytes.
pub fn validate_instrument_options(name: &str, unit: &str, description: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MetricError::invalid_name("name must not be empty"));
    }
    if name.len() > INSTRUMENT_NAME_MAX_LENGTH {
        return Err(MetricError::invalid_name(format!(
            "name must not exceed {} characters, got {}",
            INSTRUMENT_NAME_MAX_LENGTH,
            name.len()
        )));
    }
    if name.starts_with(|c: char| !c.is_ascii_alphabetic()) {
        return Err(MetricError::invalid_name(
            "name must start with an ASCII alphabetic character",
        ));
    }
    if name.contains(|c: char| {
        !c.is_ascii_alphanumeric() && !INSTRUMENT_NAME_ALLOWED_CHARS.contains(&c)
    }) {
        return Err(MetricError::invalid_name(
            "name may only contain ASCII alphanumerics and '_', '-', '.', '/'",
        ));
    }

    if unit.len() > INSTRUMENT_UNIT_MAX_LENGTH {
        return Err(MetricError::invalid_unit(format!(
            "unit must not exceed {} characters, got {}",
            INSTRUMENT_UNIT_MAX_LENGTH,
            unit.len()
        )));
    }
    if unit.contains(|c: char| !c.is_ascii()) {
        return Err(MetricError::invalid_unit("unit must be ASCII"));
    }

    if description.len() > INSTRUMENT_DESCRIPTION_MAX_LENGTH {
        return Err(MetricError::invalid_description(format!(
            "description must not exceed {} bytes, got {}",
            INSTRUMENT_DESCRIPTION_MAX_LENGTH,
            description.len()
        )));
    }

    Ok(())
}

/// Validates explicit histogram bucket boundaries: the list must be
/// non-empty, finite, and strictly increasing.
pub fn validate_explicit_buckets(boundaries: &[f64]) -> Result<()> {
    if boundaries.is_empty() {
        return Err(MetricError::invalid_boundaries("boundary list must not be empty"));
    }
    for boundary in boundaries {
        if boundary.is_nan() || boundary.is_infinite() {
            return Err(MetricError::invalid_boundaries(
                "boundaries must not contain NaN, Infinity, or -Infinity",
            ));
        }
    }
    for pair in boundaries.windows(2) {
        if pair[1] <= pair[0] {
            return Err(MetricError::invalid_boundaries(
                "boundaries must be strictly increasing",
            ));
        }
    }
    Ok(())
}

/// Computes the 64-bit identity of a meter from its name, version, and
/// schema URL (empty string substituted when absent).
pub fn meter_identifier(name: &str, version: &str, schema_url: Option<&str>) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(name.as_bytes());
    hasher.write(version.as_bytes());
    hasher.write(schema_url.unwrap_or("").as_bytes());
    hasher.finish()
}

/// Computes the identifier under which an instrument is registered with its
/// meter: lowercased name, kind tag, unit, and a hash of the description.
///
/// Names are case-insensitive; unit and description participate in identity.
pub fn instrument_identifier(
    name: &str,
    kind: InstrumentKind,
    unit: &str,
    description: &str,
) -> String {
    let mut hasher = FxHasher::default();
    hasher.write(description.as_bytes());
    format!(
        "{}|{}|{}|{:016x}",
        name.to_ascii_lowercase(),
        kind.tag(),
        unit,
        hasher.finish()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_validation() {
        // (name, valid)
        let cases = [
            ("requests", true),
            ("http.server.duration", true),
            ("allow/slash", true),
            ("allow_under-score", true),
            ("a", true),
            ("123", false),
            ("", false),
            ("alpha-?", false),
            ("_leading_underscore", false),
            ("has space", false),
            ("utf8char锈", false),
        ];
        for (name, valid) in cases {
            let result = validate_instrument_options(name, "", "");
            assert_eq!(result.is_ok(), valid, "name {:?}", name);
        }

        let long = "a".repeat(255);
        assert!(validate_instrument_options(&long, "", "").is_ok());
        let too_long = "a".repeat(256);
        assert!(matches!(
            validate_instrument_options(&too_long, "", ""),
            Err(MetricError::InvalidName(_))
        ));
    }

    #[test]
    fn test_unit_validation() {
        assert!(validate_instrument_options("n", "ms", "").is_ok());
        assert!(validate_instrument_options("n", "{request}", "").is_ok());
        assert!(validate_instrument_options("n", "", "").is_ok());

        let too_long = "b".repeat(64);
        assert!(matches!(
            validate_instrument_options("n", &too_long, ""),
            Err(MetricError::InvalidUnit(_))
        ));
        assert!(matches!(
            validate_instrument_options("n", "µs", ""),
            Err(MetricError::InvalidUnit(_))
        ));
    }

    #[test]
    fn test_description_validation() {
        let max = "d".repeat(1023);
        assert!(validate_instrument_options("n", "", &max).is_ok());
        let too_long = "d".repeat(1024);
        assert!(matches!(
            validate_instrument_options("n", "", &too_long),
            Err(MetricError::InvalidDescription(_))
        ));
    }

    #[test]
    fn test_bucket_validation() {
        assert!(validate_explicit_buckets(&DEFAULT_HISTOGRAM_BOUNDARIES).is_ok());
        assert!(validate_explicit_buckets(&[1.0, 10.0, 100.0]).is_ok());

        assert!(validate_explicit_buckets(&[]).is_err());
        assert!(validate_explicit_buckets(&[1.0, 1.0]).is_err());
        assert!(validate_explicit_buckets(&[5.0, 2.0]).is_err());
        assert!(validate_explicit_buckets(&[1.0, f64::NAN, 3.0]).is_err());
        assert!(validate_explicit_buckets(&[1.0, f64::INFINITY]).is_err());
    }

    #[test]
    fn test_meter_identifier_stability() {
        let a = meter_identifier("app", "1.0.0", Some("https://example.com/schema"));
        let b = meter_identifier("app", "1.0.0", Some("https://example.com/schema"));
        assert_eq!(a, b);

        assert_ne!(a, meter_identifier("app", "1.0.1", Some("https://example.com/schema")));
        assert_ne!(a, meter_identifier("app", "1.0.0", None));
    }

    #[test]
    fn test_instrument_identifier_components() {
        let id = instrument_identifier("Requests", InstrumentKind::Counter, "1", "total requests");
        assert!(id.starts_with("requests|c|1|"));

        // Case-insensitive name, identical identifying fields.
        let lower = instrument_identifier("requests", InstrumentKind::Counter, "1", "total requests");
        assert_eq!(id, lower);

        // Unit and description both participate in identity.
        assert_ne!(
            id,
            instrument_identifier("requests", InstrumentKind::Counter, "ms", "total requests")
        );
        assert_ne!(
            id,
            instrument_identifier("requests", InstrumentKind::Counter, "1", "other")
        );
        // Kind participates via the tag.
        assert_ne!(
            id,
            instrument_identifier("requests", InstrumentKind::UpDownCounter, "1", "total requests")
        );
    }
}
