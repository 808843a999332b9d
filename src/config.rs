/// Application-level constants
pub const APP_NAME: &str = "Riskboard";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default base URL of the risk prediction service.
const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Base URL of the risk prediction service.
///
/// Overridable via `RISKBOARD_API_URL` for non-local deployments;
/// a trailing slash is stripped so paths can be appended verbatim.
pub fn api_base_url() -> String {
    std::env::var("RISKBOARD_API_URL")
        .ok()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    "riskboard_lib=debug,info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_name_is_riskboard() {
        assert_eq!(APP_NAME, "Riskboard");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
        assert!(!APP_VERSION.is_empty());
    }

    #[test]
    fn default_api_url_is_local() {
        // Only meaningful when the env override is unset (the default in CI).
        if std::env::var("RISKBOARD_API_URL").is_err() {
            assert_eq!(api_base_url(), "http://127.0.0.1:8000");
        }
    }

    #[test]
    fn default_filter_names_the_crate() {
        let filter = default_log_filter();
        assert!(filter.contains("riskboard"));
        assert!(filter.ends_with("info"));
    }
}
