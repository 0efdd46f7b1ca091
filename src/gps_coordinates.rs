use std::collections::BTreeMap;

/// Loosely typed EXIF tag value.
///
/// Encoders disagree on how numbers are stored: the same GPS component may
/// arrive as a rational, as a `(numerator, denominator)` pair, as a plain
/// float or even as a numeric string. Values are therefore kept in this
/// shape until a consumer asks for a concrete number.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Number(f64),
    Rational { num: i64, denom: i64 },
    List(Vec<RawValue>),
    /// Nested IFD, e.g. the GPS block
    Directory(BTreeMap<u16, RawValue>),
}

impl RawValue {
    pub fn rational(num: i64, denom: i64) -> Self {
        RawValue::Rational { num, denom }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_directory(&self) -> Option<&BTreeMap<u16, RawValue>> {
        match self {
            RawValue::Directory(entries) => Some(entries),
            _ => None,
        }
    }

    /// Interprets the value as a single float.
    fn to_f64(&self) -> Option<f64> {
        let value = match self {
            RawValue::Number(n) => *n,
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
            RawValue::Rational { num, denom } => divide(*num as f64, *denom as f64)?,
            RawValue::List(_) | RawValue::Directory(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// One position of a DMS triplet: a pair is numerator / denominator,
    /// everything else is read as a single float.
    fn component_to_f64(&self) -> Option<f64> {
        match self {
            RawValue::List(pair) if pair.len() == 2 => {
                divide(pair[0].to_f64()?, pair[1].to_f64()?)
            }
            other => other.to_f64(),
        }
    }
}

fn divide(num: f64, denom: f64) -> Option<f64> {
    if denom == 0.0 {
        return None;
    }
    Some(num / denom)
}

/// Converts a GPS coordinate component to decimal degrees.
///
/// A 3-element list is read as degrees, minutes, seconds. Any other shape is
/// read as an already-decimal value. Returns `None` when the value cannot be
/// converted; the caller records the photo without that coordinate.
pub fn to_decimal_degrees(component: &RawValue) -> Option<f64> {
    let decimal = match component {
        RawValue::List(dms) if dms.len() == 3 => {
            let degrees = dms[0].component_to_f64()?;
            let minutes = dms[1].component_to_f64()?;
            let seconds = dms[2].component_to_f64()?;
            degrees + minutes / 60.0 + seconds / 3600.0
        }
        other => other.to_f64()?,
    };

    decimal.is_finite().then_some(decimal)
}
