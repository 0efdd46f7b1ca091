use log::{error, info};
use std::net::{IpAddr, TcpListener};
use std::sync::Arc;
use warp::Filter;

use photo_attendance::attendance::AttendanceService;
use photo_attendance::config::Config;
use photo_attendance::db::{self, AdminCredentials};
use photo_attendance::geolocation::HttpGeolocator;
use photo_attendance::handlers_admin::build_admin_routes;
use photo_attendance::handlers_attendance::build_attendance_routes;
use photo_attendance::handlers_health::build_health_routes;
use photo_attendance::handlers_registration::build_registration_routes;
use photo_attendance::photo_store::PhotoStore;
use photo_attendance::warp_helpers::{cors, handle_rejection};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = Config::from_env()?;
    let host: IpAddr = config.host.parse()?;
    let port = config.port;

    info!("Starting photo attendance server on {}:{}", host, port);
    info!("Data path: {}", config.data_path);
    info!("Database: {}", config.db_path);
    info!("Uploads: {}", config.upload_path);
    info!("Programs: {:?}", config.programs);

    // Check if port is available BEFORE initializing services
    if !is_port_available(host, port) {
        error!(
            "Port {} is already in use. Please stop any existing instance or set ATTENDANCE_PORT.",
            port
        );
        error!("You can check what's using the port with: lsof -i :{}", port);
        return Err(format!("Port {} is already in use", port).into());
    }

    let db_pool = db::create_db_pool(&config.db_path).await?;
    info!("Database initialized successfully");

    AdminCredentials::seed(&db_pool, &config.admin.username, &config.admin.password).await?;

    let photo_store = PhotoStore::new(&config.upload_path)?;
    let geolocator = Arc::new(HttpGeolocator::new(&config.geo));
    let attendance_service = AttendanceService::new(db_pool.clone(), photo_store.clone(), geolocator);
    let programs = Arc::new(config.programs.clone());

    let health_routes = build_health_routes(db_pool.clone(), photo_store.clone());
    let registration_routes = build_registration_routes(db_pool.clone(), programs);
    let attendance_routes =
        build_attendance_routes(db_pool.clone(), attendance_service, config.max_upload_bytes);
    let admin_routes = build_admin_routes(db_pool, photo_store);

    let routes = health_routes
        .or(registration_routes)
        .or(attendance_routes)
        .or(admin_routes)
        .with(cors())
        .with(warp::log("photo_attendance"))
        .recover(handle_rejection);

    info!(
        "Server started successfully, listening on http://{}:{}",
        host, port
    );

    warp::serve(routes).run((host, port)).await;

    Ok(())
}

fn is_port_available(host: IpAddr, port: u16) -> bool {
    TcpListener::bind((host, port)).is_ok()
}
