pub mod attendance;
pub mod config;
pub mod csv_export;
pub mod db;
pub mod exif_tags;
pub mod geolocation;
pub mod gps_coordinates;
pub mod handlers_admin;
pub mod handlers_attendance;
pub mod handlers_health;
pub mod handlers_registration;
pub mod metadata_extractor;
pub mod photo_store;
pub mod uploaded_image;
pub mod warp_helpers;
