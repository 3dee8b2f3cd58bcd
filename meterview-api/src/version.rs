// Service version, read from a VERSION file when one is deployed next to the
// binary, otherwise the crate version baked in at compile time.

use std::fs;

const VERSION_FILE_CANDIDATES: [&str; 3] = ["VERSION", "../VERSION", "../../VERSION"];

pub fn get_service_version() -> String {
    VERSION_FILE_CANDIDATES
        .iter()
        .find_map(|path| fs::read_to_string(path).ok())
        .map(|contents| contents.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string())
}

#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct VersionInfo {
    pub service: String,
    pub version: String,
    pub build_time: String,
}

pub fn get_version_info() -> VersionInfo {
    VersionInfo {
        service: env!("CARGO_PKG_NAME").to_string(),
        version: get_service_version(),
        build_time: chrono::Utc::now()
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string(),
    }
}
