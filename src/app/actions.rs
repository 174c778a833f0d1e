use crate::fit::Size;
use crate::model::PageKey;
use eframe::egui;

use super::settings;
use super::{AnnotatorApp, ImageSlot, MaskTexture};

impl AnnotatorApp {
    pub(super) fn add_page_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg"])
            .pick_file()
        {
            let path_str = path.display().to_string();
            self.editor.add_page(path_str.clone());
            self.status = Some(format!("Added {path_str}"));
        }
    }

    pub(super) fn import_segments_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .pick_file()
        {
            let result = std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|json| self.editor.import_segments(&json).map_err(|e| e.to_string()));
            self.status = Some(match result {
                Ok(count) => format!("Imported {count} segment(s)"),
                Err(e) => format!("Import failed: {e}"),
            });
        }
    }

    pub(super) fn export_mask_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(&self.settings.mask_file_name)
            .add_filter("PNG", &["png"])
            .save_file()
        {
            match self.editor.export_mask(&path) {
                Ok(()) => self.status = Some(format!("Saved {}", path.display())),
                Err(e) => {
                    log::warn!("Mask export failed: {e}");
                    self.status = Some(format!("Export failed: {e}"));
                }
            }
        }
    }

    pub(super) fn delete_page(&mut self, key: PageKey) {
        if let Err(e) = self.editor.delete_page(key) {
            log::warn!("Delete refused: {e}");
            self.status = Some(format!("Cannot delete page: {e}"));
        }
    }

    /// Writes brush width and fit policy back to the settings file.
    pub(super) fn persist_settings(&mut self) {
        self.settings.brush_width = self.editor.brush().width;
        self.settings.fit_policy = self.editor.fit_policy();
        if let Err(e) = settings::save_settings(&self.settings_path, &self.settings) {
            log::warn!("Could not save {}: {e}", self.settings_path);
            self.status = Some(format!("Settings save failed: {e}"));
        }
    }

    /// Decodes `src` once and records its native size with the editor.
    pub(super) fn ensure_image(&mut self, ctx: &egui::Context, src: &str) -> Option<egui::TextureId> {
        if !self.images.contains_key(src) {
            let slot = match image::open(src) {
                Ok(img) => {
                    let rgba = img.to_rgba8();
                    let (w, h) = rgba.dimensions();
                    let color_image = egui::ColorImage::from_rgba_unmultiplied(
                        [w as usize, h as usize],
                        rgba.as_raw(),
                    );
                    let texture = ctx.load_texture(src, color_image, egui::TextureOptions::LINEAR);
                    self.editor
                        .set_image_size(src, Some(Size::new(w as f32, h as f32)));
                    log::info!("Loaded {src} ({w}x{h})");
                    ImageSlot::Loaded(texture)
                }
                Err(e) => {
                    log::warn!("Could not load image {src}: {e}");
                    self.editor.set_image_size(src, None);
                    ImageSlot::Failed
                }
            };
            self.images.insert(src.to_string(), slot);
        }
        match self.images.get(src) {
            Some(ImageSlot::Loaded(texture)) => Some(texture.id()),
            _ => None,
        }
    }

    /// Re-rasterizes the paint layer when the page, its strokes or the stage
    /// size changed since the last upload.
    pub(super) fn mask_texture(&mut self, ctx: &egui::Context) -> Option<egui::TextureId> {
        let page = self.editor.selected_page()?.key;
        let revision = self.editor.revision();
        let size = self.editor.mask_size();
        if let Some(mask) = &self.mask {
            if mask.page == page && mask.revision == revision && mask.size == size {
                return Some(mask.texture.id());
            }
        }
        let raster = match self.editor.render_mask() {
            Ok(raster) => raster,
            Err(e) => {
                log::debug!("No paint layer: {e}");
                self.mask = None;
                return None;
            }
        };
        let color_image = egui::ColorImage::from_rgba_unmultiplied(
            [size.0 as usize, size.1 as usize],
            raster.as_raw(),
        );
        match &mut self.mask {
            Some(mask) => {
                mask.texture.set(color_image, egui::TextureOptions::LINEAR);
                mask.page = page;
                mask.revision = revision;
                mask.size = size;
            }
            None => {
                let texture = ctx.load_texture("paint_mask", color_image, egui::TextureOptions::LINEAR);
                self.mask = Some(MaskTexture {
                    page,
                    revision,
                    size,
                    texture,
                });
            }
        }
        self.mask.as_ref().map(|m| m.texture.id())
    }
}
