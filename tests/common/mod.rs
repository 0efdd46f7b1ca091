#![allow(dead_code)]

use std::io::Cursor;

use exif::{Field, In, Rational, Tag, Value};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use img_parts::jpeg::Jpeg;
use img_parts::{Bytes, ImageEXIF};

pub fn ascii(tag: Tag, text: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    }
}

/// Degrees, minutes and seconds as three rationals
pub fn dms(tag: Tag, parts: [(u32, u32); 3]) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Rational(parts.iter().map(|&(num, denom)| Rational { num, denom }).collect()),
    }
}

pub fn tiff_with(fields: &[Field]) -> Vec<u8> {
    let mut writer = exif::experimental::Writer::new();
    for field in fields {
        writer.push_field(field);
    }

    let mut buffer = Cursor::new(Vec::new());
    writer.write(&mut buffer, false).unwrap();
    buffer.into_inner()
}

pub fn plain_jpeg() -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 12, Rgb([90, 120, 200])))
        .write_to(&mut buffer, ImageFormat::Jpeg)
        .unwrap();
    buffer.into_inner()
}

pub fn jpeg_with(fields: &[Field]) -> Vec<u8> {
    let mut jpeg = Jpeg::from_bytes(Bytes::from(plain_jpeg())).unwrap();
    jpeg.set_exif(Some(Bytes::from(tiff_with(fields))));
    jpeg.encoder().bytes().to_vec()
}

/// Photo taken at 10°30'S 73°15'36"E on 14 Aug 2023
pub fn campus_photo_fields() -> Vec<Field> {
    vec![
        ascii(Tag::DateTime, "2023:08:20 18:00:00"),
        ascii(Tag::DateTimeOriginal, "2023:08:14 09:41:05"),
        ascii(Tag::GPSLatitudeRef, "S"),
        dms(Tag::GPSLatitude, [(10, 1), (30, 1), (0, 1)]),
        ascii(Tag::GPSLongitudeRef, "E"),
        dms(Tag::GPSLongitude, [(73, 1), (15, 1), (3600, 100)]),
    ]
}

pub fn approx(actual: Option<f64>, expected: f64) -> bool {
    actual.is_some_and(|value| (value - expected).abs() < 1e-9)
}
