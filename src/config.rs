use std::env;

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct GeoConfig {
    pub reverse_geocode_url: String,
    pub ip_echo_url: String,
    pub ip_info_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    pub data_path: String,
    pub db_path: String,
    pub upload_path: String,
    pub admin: AdminConfig,
    pub geo: GeoConfig,
    pub programs: Vec<String>,
    pub max_upload_bytes: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let data_path =
            env::var("ATTENDANCE_DATA_PATH").unwrap_or_else(|_| "./data".to_string());

        let max_upload_mb: u64 = env::var("ATTENDANCE_MAX_UPLOAD_MB")
            .unwrap_or_else(|_| "20".to_string())
            .parse()?;

        Ok(Config {
            port: env::var("ATTENDANCE_PORT")
                .unwrap_or_else(|_| "18474".to_string())
                .parse()?,
            host: env::var("ATTENDANCE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            db_path: env::var("ATTENDANCE_DB_PATH")
                .unwrap_or_else(|_| format!("{}/database/attendance.db", data_path)),
            upload_path: env::var("ATTENDANCE_UPLOAD_PATH")
                .unwrap_or_else(|_| format!("{}/uploads", data_path)),
            data_path,
            admin: AdminConfig {
                username: env::var("ATTENDANCE_ADMIN_USERNAME")
                    .unwrap_or_else(|_| "admin".to_string()),
                password: env::var("ATTENDANCE_ADMIN_PASSWORD")
                    .unwrap_or_else(|_| "changeme".to_string()),
            },
            geo: GeoConfig {
                reverse_geocode_url: env::var("ATTENDANCE_GEOCODER_URL").unwrap_or_else(|_| {
                    "https://nominatim.openstreetmap.org/reverse".to_string()
                }),
                ip_echo_url: env::var("ATTENDANCE_IP_ECHO_URL")
                    .unwrap_or_else(|_| "https://api64.ipify.org?format=json".to_string()),
                ip_info_url: env::var("ATTENDANCE_IP_INFO_URL")
                    .unwrap_or_else(|_| "https://ipinfo.io".to_string()),
                user_agent: env::var("ATTENDANCE_GEO_USER_AGENT")
                    .unwrap_or_else(|_| "attendance_app".to_string()),
                timeout_secs: env::var("ATTENDANCE_GEO_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
            },
            programs: env::var("ATTENDANCE_PROGRAMS")
                .unwrap_or_else(|_| "BASM4,BASM2,MAPA2,MAPA4,BASM6,BASM3".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            max_upload_bytes: max_upload_mb * 1024 * 1024,
        })
    }
}
