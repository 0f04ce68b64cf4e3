use crate::config::Settings;
use crate::models::AppInfo;

/// Print the service identity for the current settings.
pub fn cmd_info(settings: &Settings) -> anyhow::Result<()> {
    let info = AppInfo::from_settings(settings);
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
