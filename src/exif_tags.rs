//! Static tag-name registries.
//!
//! The primary/Exif IFD and the GPS IFD use separate numeric spaces: tag 2 is
//! `GPSLatitude` inside the GPS block but means nothing in the primary IFD.
//! Always resolve a tag through the registry of the block it was read from.

pub const DATE_TIME: &str = "DateTime";
pub const DATE_TIME_ORIGINAL: &str = "DateTimeOriginal";
pub const GPS_INFO: &str = "GPSInfo";

pub const GPS_LATITUDE_REF: &str = "GPSLatitudeRef";
pub const GPS_LATITUDE: &str = "GPSLatitude";
pub const GPS_LONGITUDE_REF: &str = "GPSLongitudeRef";
pub const GPS_LONGITUDE: &str = "GPSLongitude";

/// Tag ID of the GPS IFD pointer in the primary IFD
pub const GPS_INFO_TAG: u16 = 0x8825;

const MAIN_TAGS: &[(u16, &str)] = &[
    (0x0100, "ImageWidth"),
    (0x0101, "ImageLength"),
    (0x010E, "ImageDescription"),
    (0x010F, "Make"),
    (0x0110, "Model"),
    (0x0112, "Orientation"),
    (0x011A, "XResolution"),
    (0x011B, "YResolution"),
    (0x0128, "ResolutionUnit"),
    (0x0131, "Software"),
    (0x0132, DATE_TIME),
    (0x013B, "Artist"),
    (0x0213, "YCbCrPositioning"),
    (0x8298, "Copyright"),
    (0x829A, "ExposureTime"),
    (0x829D, "FNumber"),
    (0x8769, "ExifOffset"),
    (0x8822, "ExposureProgram"),
    (0x8827, "ISOSpeedRatings"),
    (GPS_INFO_TAG, GPS_INFO),
    (0x9000, "ExifVersion"),
    (0x9003, DATE_TIME_ORIGINAL),
    (0x9004, "DateTimeDigitized"),
    (0x9010, "OffsetTime"),
    (0x9011, "OffsetTimeOriginal"),
    (0x9012, "OffsetTimeDigitized"),
    (0x9101, "ComponentsConfiguration"),
    (0x9201, "ShutterSpeedValue"),
    (0x9202, "ApertureValue"),
    (0x9204, "ExposureBiasValue"),
    (0x9207, "MeteringMode"),
    (0x9209, "Flash"),
    (0x920A, "FocalLength"),
    (0x927C, "MakerNote"),
    (0x9286, "UserComment"),
    (0x9290, "SubsecTime"),
    (0x9291, "SubsecTimeOriginal"),
    (0x9292, "SubsecTimeDigitized"),
    (0xA000, "FlashPixVersion"),
    (0xA001, "ColorSpace"),
    (0xA002, "ExifImageWidth"),
    (0xA003, "ExifImageHeight"),
    (0xA005, "ExifInteroperabilityOffset"),
    (0xA402, "ExposureMode"),
    (0xA403, "WhiteBalance"),
    (0xA405, "FocalLengthIn35mmFilm"),
    (0xA406, "SceneCaptureType"),
    (0xA420, "ImageUniqueID"),
    (0xA433, "LensMake"),
    (0xA434, "LensModel"),
];

const GPS_TAGS: &[(u16, &str)] = &[
    (0x00, "GPSVersionID"),
    (0x01, GPS_LATITUDE_REF),
    (0x02, GPS_LATITUDE),
    (0x03, GPS_LONGITUDE_REF),
    (0x04, GPS_LONGITUDE),
    (0x05, "GPSAltitudeRef"),
    (0x06, "GPSAltitude"),
    (0x07, "GPSTimeStamp"),
    (0x08, "GPSSatellites"),
    (0x09, "GPSStatus"),
    (0x0A, "GPSMeasureMode"),
    (0x0B, "GPSDOP"),
    (0x0C, "GPSSpeedRef"),
    (0x0D, "GPSSpeed"),
    (0x0E, "GPSTrackRef"),
    (0x0F, "GPSTrack"),
    (0x10, "GPSImgDirectionRef"),
    (0x11, "GPSImgDirection"),
    (0x12, "GPSMapDatum"),
    (0x13, "GPSDestLatitudeRef"),
    (0x14, "GPSDestLatitude"),
    (0x15, "GPSDestLongitudeRef"),
    (0x16, "GPSDestLongitude"),
    (0x17, "GPSDestBearingRef"),
    (0x18, "GPSDestBearing"),
    (0x19, "GPSDestDistanceRef"),
    (0x1A, "GPSDestDistance"),
    (0x1B, "GPSProcessingMethod"),
    (0x1C, "GPSAreaInformation"),
    (0x1D, "GPSDateStamp"),
    (0x1E, "GPSDifferential"),
    (0x1F, "GPSHPositioningError"),
];

fn lookup(table: &[(u16, &'static str)], id: u16) -> Option<&'static str> {
    table
        .iter()
        .find(|(tag_id, _)| *tag_id == id)
        .map(|(_, name)| *name)
}

/// Name of a tag in the primary or Exif IFD
pub fn tag_name(id: u16) -> Option<&'static str> {
    lookup(MAIN_TAGS, id)
}

/// Name of a tag in the GPS IFD
pub fn gps_tag_name(id: u16) -> Option<&'static str> {
    lookup(GPS_TAGS, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_registry() {
        assert_eq!(tag_name(0x9003), Some(DATE_TIME_ORIGINAL));
        assert_eq!(tag_name(0x0132), Some(DATE_TIME));
        assert_eq!(tag_name(GPS_INFO_TAG), Some(GPS_INFO));
        assert_eq!(tag_name(0xFFFF), None);
    }

    #[test]
    fn test_gps_registry() {
        assert_eq!(gps_tag_name(1), Some(GPS_LATITUDE_REF));
        assert_eq!(gps_tag_name(2), Some(GPS_LATITUDE));
        assert_eq!(gps_tag_name(3), Some(GPS_LONGITUDE_REF));
        assert_eq!(gps_tag_name(4), Some(GPS_LONGITUDE));
        assert_eq!(gps_tag_name(0x8825), None);
    }

    #[test]
    fn test_registries_are_distinct() {
        // Same ID, different meaning per block
        assert_eq!(tag_name(0x0002), None);
        assert_eq!(gps_tag_name(0x0002), Some(GPS_LATITUDE));
        assert_ne!(tag_name(0x0110), gps_tag_name(0x0110));
    }

    #[test]
    fn test_tables_have_unique_ids() {
        for table in [MAIN_TAGS, GPS_TAGS] {
            for (i, (id, _)) in table.iter().enumerate() {
                assert!(
                    table[i + 1..].iter().all(|(other, _)| other != id),
                    "duplicate tag id {:#06x}",
                    id
                );
            }
        }
    }
}
