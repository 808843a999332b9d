pub mod api;
pub mod chart;
#[cfg(feature = "desktop")]
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod importance;
pub mod models;
pub mod normalize;
pub mod view;

#[cfg(feature = "desktop")]
use std::sync::Arc;
#[cfg(feature = "desktop")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Riskboard starting v{}", config::APP_VERSION);

    let dashboard = dashboard::Dashboard::new(api::HttpRiskApi::from_env());

    tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        .manage(Arc::new(dashboard))
        .invoke_handler(tauri::generate_handler![
            commands::health_check,
            commands::check_service_status,
            commands::dashboard::load_dashboard,
            commands::dashboard::get_dashboard,
            commands::dashboard::select_patient,
            commands::patient::add_patient,
            commands::patient::get_patient,
            commands::patient::list_features,
        ])
        .run(tauri::generate_context!())
        .expect("error while running Riskboard");
}
