use std::collections::BTreeMap;
use std::io::Cursor;

use exif::{Context, In, Reader, Value};
use serde::Serialize;

use crate::exif_tags::{
    self, DATE_TIME, DATE_TIME_ORIGINAL, GPS_INFO, GPS_LATITUDE, GPS_LATITUDE_REF,
    GPS_LONGITUDE, GPS_LONGITUDE_REF,
};
use crate::gps_coordinates::{to_decimal_degrees, RawValue};

/// Raw metadata of one image: tag ID to value, GPS block nested under 0x8825.
pub type RawExif = BTreeMap<u16, RawValue>;

/// Anything that can hand out the raw embedded metadata of a decoded image.
pub trait ExifSource {
    /// `None` when the image carries no (readable) metadata.
    fn raw_exif(&self) -> Option<RawExif>;
}

impl ExifSource for RawExif {
    fn raw_exif(&self) -> Option<RawExif> {
        Some(self.clone())
    }
}

impl<T: ExifSource> ExifSource for Option<T> {
    fn raw_exif(&self) -> Option<RawExif> {
        self.as_ref().and_then(|source| source.raw_exif())
    }
}

/// Capture time and position found in an uploaded photo.
///
/// Every field is independent: a broken latitude does not hide the longitude
/// or the timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaptureRecord {
    /// Verbatim EXIF value, `YYYY:MM:DD HH:MM:SS`
    pub capture_timestamp: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl CaptureRecord {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

pub struct MetadataExtractor;

impl MetadataExtractor {
    pub fn extract(source: &impl ExifSource) -> CaptureRecord {
        let Some(raw) = source.raw_exif() else {
            return CaptureRecord::default();
        };

        let tags = Self::resolve(&raw, exif_tags::tag_name);

        let capture_timestamp = [DATE_TIME_ORIGINAL, DATE_TIME]
            .iter()
            .filter_map(|name| tags.get(name))
            .filter_map(|value| value.as_text())
            .map(str::to_string)
            .next();

        let gps = tags
            .get(GPS_INFO)
            .and_then(|value| value.as_directory())
            .map(|block| Self::resolve(block, exif_tags::gps_tag_name))
            .unwrap_or_default();

        CaptureRecord {
            capture_timestamp,
            latitude: Self::signed_coordinate(&gps, GPS_LATITUDE, GPS_LATITUDE_REF, "S"),
            longitude: Self::signed_coordinate(&gps, GPS_LONGITUDE, GPS_LONGITUDE_REF, "W"),
        }
    }

    /// Maps tag IDs to names, dropping IDs the registry does not know.
    fn resolve<'a>(
        block: &'a BTreeMap<u16, RawValue>,
        registry: fn(u16) -> Option<&'static str>,
    ) -> BTreeMap<&'static str, &'a RawValue> {
        block
            .iter()
            .filter_map(|(id, value)| registry(*id).map(|name| (name, value)))
            .collect()
    }

    /// A missing reference tag leaves the sign untouched.
    fn signed_coordinate(
        gps: &BTreeMap<&'static str, &RawValue>,
        coordinate_tag: &str,
        reference_tag: &str,
        negative_marker: &str,
    ) -> Option<f64> {
        let magnitude = to_decimal_degrees(gps.get(coordinate_tag)?)?;
        let reference = gps.get(reference_tag).and_then(|value| value.as_text());

        if reference == Some(negative_marker) {
            Some(-magnitude)
        } else {
            Some(magnitude)
        }
    }
}

/// EXIF block read from an image container (JPEG, PNG, TIFF, WebP, HEIF)
/// with kamadak-exif.
pub struct ContainerExif;

impl ContainerExif {
    pub fn from_bytes(bytes: &[u8]) -> Option<RawExif> {
        let exif = Reader::new()
            .read_from_container(&mut Cursor::new(bytes))
            .ok()?;

        let mut main = RawExif::new();
        let mut gps = BTreeMap::new();

        for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
            let Some(value) = Self::convert_value(&field.value) else {
                continue;
            };
            match field.tag.context() {
                Context::Tiff | Context::Exif => {
                    main.insert(field.tag.number(), value);
                }
                Context::Gps => {
                    gps.insert(field.tag.number(), value);
                }
                _ => {}
            }
        }

        if !gps.is_empty() {
            main.insert(exif_tags::GPS_INFO_TAG, RawValue::Directory(gps));
        }

        if main.is_empty() {
            None
        } else {
            Some(main)
        }
    }

    /// Clean EXIF string values by removing null bytes and surrounding
    /// whitespace
    fn clean_exif_string(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes)
            .replace('\0', "")
            .trim()
            .to_string()
    }

    fn convert_value(value: &Value) -> Option<RawValue> {
        fn collapse(mut items: Vec<RawValue>) -> Option<RawValue> {
            match items.len() {
                0 => None,
                1 => items.pop(),
                _ => Some(RawValue::List(items)),
            }
        }

        fn numbers<T: Copy + Into<f64>>(values: &[T]) -> Option<RawValue> {
            collapse(values.iter().map(|v| RawValue::Number((*v).into())).collect())
        }

        match value {
            Value::Ascii(strings) => strings
                .first()
                .map(|s| RawValue::Text(Self::clean_exif_string(s))),
            Value::Byte(v) => numbers(v),
            Value::Short(v) => numbers(v),
            Value::Long(v) => numbers(v),
            Value::SByte(v) => numbers(v),
            Value::SShort(v) => numbers(v),
            Value::SLong(v) => numbers(v),
            Value::Float(v) => numbers(v),
            Value::Double(v) => numbers(v),
            Value::Rational(v) => collapse(
                v.iter()
                    .map(|r| RawValue::rational(r.num.into(), r.denom.into()))
                    .collect(),
            ),
            Value::SRational(v) => collapse(
                v.iter()
                    .map(|r| RawValue::rational(r.num.into(), r.denom.into()))
                    .collect(),
            ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN_DATE_TIME: u16 = 0x0132;
    const MAIN_DATE_TIME_ORIGINAL: u16 = 0x9003;

    fn dms(d: i64, m: i64, s: i64) -> RawValue {
        RawValue::List(vec![
            RawValue::rational(d, 1),
            RawValue::rational(m, 1),
            RawValue::rational(s, 1),
        ])
    }

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_string())
    }

    fn with_gps(gps: Vec<(u16, RawValue)>) -> RawExif {
        let mut raw = RawExif::new();
        raw.insert(
            exif_tags::GPS_INFO_TAG,
            RawValue::Directory(gps.into_iter().collect()),
        );
        raw
    }

    #[test]
    fn test_no_metadata_yields_empty_record() {
        let none: Option<RawExif> = None;
        assert_eq!(MetadataExtractor::extract(&none), CaptureRecord::default());
    }

    #[test]
    fn test_southern_latitude_is_negated() {
        let raw = with_gps(vec![(1, text("S")), (2, dms(10, 30, 0))]);
        let record = MetadataExtractor::extract(&raw);
        assert_eq!(record.latitude, Some(-10.5));
        assert_eq!(record.longitude, None);
    }

    #[test]
    fn test_eastern_longitude_keeps_sign() {
        let raw = with_gps(vec![(3, text("E")), (4, dms(73, 15, 36))]);
        let record = MetadataExtractor::extract(&raw);
        let longitude = record.longitude.unwrap();
        assert!((longitude - 73.26).abs() < 1e-9);
    }

    #[test]
    fn test_western_longitude_is_negated() {
        let raw = with_gps(vec![(3, text("W")), (4, dms(0, 7, 39))]);
        let longitude = MetadataExtractor::extract(&raw).longitude.unwrap();
        assert!((longitude + 0.1275).abs() < 1e-9);
    }

    #[test]
    fn test_missing_reference_keeps_raw_sign() {
        let raw = with_gps(vec![(2, dms(10, 30, 0)), (4, dms(20, 0, 0))]);
        let record = MetadataExtractor::extract(&raw);
        assert_eq!(record.latitude, Some(10.5));
        assert_eq!(record.longitude, Some(20.0));
    }

    #[test]
    fn test_original_capture_preferred() {
        let mut raw = RawExif::new();
        raw.insert(MAIN_DATE_TIME, text("2024:01:01 00:00:00"));
        raw.insert(MAIN_DATE_TIME_ORIGINAL, text("2023:08:14 09:41:05"));
        let record = MetadataExtractor::extract(&raw);
        assert_eq!(
            record.capture_timestamp.as_deref(),
            Some("2023:08:14 09:41:05")
        );
    }

    #[test]
    fn test_original_capture_without_modification_tag() {
        let mut raw = RawExif::new();
        raw.insert(MAIN_DATE_TIME_ORIGINAL, text("2023:08:14 09:41:05"));
        let record = MetadataExtractor::extract(&raw);
        assert_eq!(
            record.capture_timestamp.as_deref(),
            Some("2023:08:14 09:41:05")
        );
    }

    #[test]
    fn test_modification_timestamp_fallback() {
        let mut raw = RawExif::new();
        raw.insert(MAIN_DATE_TIME, text("2024:02:29 18:00:00"));
        let record = MetadataExtractor::extract(&raw);
        assert_eq!(
            record.capture_timestamp.as_deref(),
            Some("2024:02:29 18:00:00")
        );
    }

    #[test]
    fn test_malformed_latitude_does_not_hide_other_fields() {
        let mut raw = with_gps(vec![
            (1, text("N")),
            (
                2,
                RawValue::List(vec![
                    RawValue::rational(10, 0),
                    RawValue::rational(30, 1),
                    RawValue::rational(0, 1),
                ]),
            ),
            (3, text("E")),
            (4, dms(73, 15, 36)),
        ]);
        raw.insert(MAIN_DATE_TIME_ORIGINAL, text("2023:08:14 09:41:05"));

        let record = MetadataExtractor::extract(&raw);
        assert_eq!(record.latitude, None);
        assert!(record.longitude.is_some());
        assert!(record.capture_timestamp.is_some());
        assert_eq!(record.coordinates(), None);
    }

    #[test]
    fn test_gps_ids_are_not_read_from_main_block() {
        // Tag 2 outside the GPS block is not a latitude
        let mut raw = RawExif::new();
        raw.insert(2, dms(10, 30, 0));
        raw.insert(1, text("S"));
        assert_eq!(MetadataExtractor::extract(&raw), CaptureRecord::default());
    }

    #[test]
    fn test_gps_info_that_is_not_a_block_is_ignored() {
        let mut raw = RawExif::new();
        raw.insert(exif_tags::GPS_INFO_TAG, RawValue::Number(26.0));
        raw.insert(MAIN_DATE_TIME, text("2024:02:29 18:00:00"));
        let record = MetadataExtractor::extract(&raw);
        assert_eq!(record.latitude, None);
        assert!(record.capture_timestamp.is_some());
    }

    #[test]
    fn test_container_without_exif() {
        assert_eq!(ContainerExif::from_bytes(b"not an image at all"), None);
        assert_eq!(ContainerExif::from_bytes(&[]), None);
    }

    #[test]
    fn test_clean_exif_string_removes_null_bytes() {
        assert_eq!(ContainerExif::clean_exif_string(b"S\0"), "S");
        assert_eq!(ContainerExif::clean_exif_string(b"  Canon  "), "Canon");
    }

    #[test]
    fn test_convert_value_shapes() {
        use exif::Rational;

        assert_eq!(
            ContainerExif::convert_value(&Value::Ascii(vec![b"N".to_vec()])),
            Some(text("N"))
        );
        assert_eq!(
            ContainerExif::convert_value(&Value::Short(vec![3])),
            Some(RawValue::Number(3.0))
        );
        assert_eq!(
            ContainerExif::convert_value(&Value::Rational(vec![
                Rational { num: 10, denom: 1 },
                Rational { num: 30, denom: 1 },
                Rational { num: 0, denom: 1 },
            ])),
            Some(dms(10, 30, 0))
        );
        assert_eq!(
            ContainerExif::convert_value(&Value::Undefined(vec![0, 1], 0)),
            None
        );
        assert_eq!(ContainerExif::convert_value(&Value::Long(vec![])), None);
    }
}
