use crate::editor::EditorConfig;
use crate::error::SettingsError;
use crate::fit::{FitPolicy, Size};
use serde::{Deserialize, Serialize};

pub(super) const DEMO_IMAGE: &str = "https://picsum.photos/800/1200";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(super) struct AppSettings {
    pub stage_width: f32,
    pub stage_height: f32,
    pub fit_policy: FitPolicy,
    pub brush_width: f32,
    pub brush_min: f32,
    pub brush_max: f32,
    pub brush_step: f32,
    pub mask_file_name: String,
    pub seed_demo_page: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            stage_width: 800.0,
            stage_height: 800.0,
            fit_policy: FitPolicy::Native,
            brush_width: 5.0,
            brush_min: 5.0,
            brush_max: 50.0,
            brush_step: 5.0,
            mask_file_name: "mask.png".to_string(),
            seed_demo_page: true,
        }
    }
}

impl AppSettings {
    pub fn editor_config(&self) -> EditorConfig {
        EditorConfig {
            stage: Size::new(self.stage_width, self.stage_height),
            fit_policy: self.fit_policy,
            brush_width: self.brush_width,
            brush_min: self.brush_min,
            brush_max: self.brush_max,
        }
    }
}

fn parse(path: &str, s: &str) -> Result<AppSettings, SettingsError> {
    if path.ends_with(".toml") {
        toml::from_str::<AppSettings>(s).or_else(|e| {
            serde_json::from_str::<AppSettings>(s).map_err(|_| SettingsError::TomlDe(e))
        })
    } else {
        serde_json::from_str::<AppSettings>(s).or_else(|e| {
            toml::from_str::<AppSettings>(s).map_err(|_| SettingsError::Json(e))
        })
    }
}

pub(super) fn load_settings(path: &str) -> Result<AppSettings, SettingsError> {
    let s = std::fs::read_to_string(path)?;
    parse(path, &s)
}

pub(super) fn save_settings(path: &str, settings: &AppSettings) -> Result<(), SettingsError> {
    let text = if path.ends_with(".toml") {
        toml::to_string_pretty(settings)?
    } else {
        serde_json::to_string_pretty(settings)?
    };
    std::fs::write(path, text)?;
    Ok(())
}
