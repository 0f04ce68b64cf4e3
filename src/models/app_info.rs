use serde::Serialize;

use crate::config::Settings;

/// Identity of the running service, attached to every annotation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppInfo {
    pub service_app_name: String,
    pub service_language: String,
    pub service_version: String,
    pub service_model: String,
}

impl AppInfo {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            service_app_name: settings.app_name.clone(),
            service_language: settings.app_language.clone(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            service_model: settings.model_name.clone(),
        }
    }
}
