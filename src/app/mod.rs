use crate::editor::Editor;
use crate::model::{self, PageKey};
use crate::store::DocumentStore;
use eframe::egui;
use std::collections::HashMap;

mod actions;
mod render;
mod settings;
mod update;

/// Decode result for one source image, cached by path.
enum ImageSlot {
    Loaded(egui::TextureHandle),
    Failed,
}

/// The paint layer as last uploaded to the GPU.
struct MaskTexture {
    page: PageKey,
    revision: u64,
    size: (u32, u32),
    texture: egui::TextureHandle,
}

pub struct AnnotatorApp {
    editor: Editor,
    settings: settings::AppSettings,
    settings_path: String,
    images: HashMap<String, ImageSlot>,
    mask: Option<MaskTexture>,
    pointer_down: bool,
    status: Option<String>,
}

impl AnnotatorApp {
    fn config_path() -> Option<String> {
        if let Some(home) = std::env::var_os("HOME") {
            let path = std::path::PathBuf::from(home)
                .join(".config")
                .join("page-annotator.toml");
            if path.exists() {
                return Some(path.display().to_string());
            }
        }
        if std::path::Path::new("settings.toml").exists() {
            return Some("settings.toml".to_string());
        }
        None
    }

    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::light());

        let settings_path = Self::config_path().unwrap_or_else(|| "settings.toml".to_string());
        let mut settings = settings::load_settings(&settings_path)
            .or_else(|_| settings::load_settings("settings.json"))
            .unwrap_or_else(|e| {
                log::debug!("Using default settings ({e})");
                settings::AppSettings::default()
            });

        let store = if settings.seed_demo_page {
            DocumentStore::from_pages(vec![model::demo_page(settings::DEMO_IMAGE)])
        } else {
            DocumentStore::default()
        };
        // The brush slider reads its range from the settings.
        let config = settings.editor_config().sanitized();
        settings.brush_min = config.brush_min;
        settings.brush_max = config.brush_max;
        let mut editor = Editor::new(store, config);
        editor.subscribe(|event| log::debug!("Store event: {event:?}"));
        editor.on_selection_change(|key| match key {
            Some(key) => log::debug!("Active text box: {key}"),
            None => log::debug!("No active text box"),
        });

        log::info!(
            "Started with {} page(s), settings from {settings_path}",
            editor.document().pages.len()
        );

        Self {
            editor,
            settings,
            settings_path,
            images: HashMap::new(),
            mask: None,
            pointer_down: false,
            status: None,
        }
    }
}
