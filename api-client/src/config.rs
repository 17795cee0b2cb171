//! Runtime configuration for the backend client.

/// Default backend base URL (the platform's development port).
const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

/// Get the backend base URL.
///
/// Priority:
/// 1. `PAWNBOT_API_URL` env variable if set
/// 2. `http://localhost:8080` as fallback
pub fn get_api_base_url() -> String {
    if let Ok(url) = std::env::var("PAWNBOT_API_URL") {
        return url;
    }

    DEFAULT_API_BASE_URL.to_string()
}
