use crate::db::AttendanceRecord;

pub const CSV_HEADERS: [&str; 10] = [
    "Group",
    "Name",
    "Roll_No",
    "Capture_Date",
    "Capture_Time",
    "Latitude",
    "Longitude",
    "Photo_Location",
    "Upload_Location",
    "Image_File",
];

/// Renders the attendance log as RFC 4180 CSV with CRLF line endings.
pub fn attendance_to_csv(records: &[AttendanceRecord]) -> String {
    let mut out = String::new();
    push_row(&mut out, CSV_HEADERS.iter().map(|h| h.to_string()));

    for record in records {
        push_row(
            &mut out,
            [
                record.group_name.clone(),
                record.name.clone(),
                record.roll_no.clone(),
                record.capture_date.clone(),
                record.capture_time.clone(),
                format_coordinate(record.latitude),
                format_coordinate(record.longitude),
                record.photo_location.clone(),
                record.upload_location.clone(),
                record.image_file.clone(),
            ]
            .into_iter(),
        );
    }

    out
}

fn format_coordinate(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn push_row(out: &mut String, fields: impl Iterator<Item = String>) {
    let row: Vec<String> = fields.map(|field| escape_field(&field)).collect();
    out.push_str(&row.join(","));
    out.push_str("\r\n");
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
