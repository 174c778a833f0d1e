use crate::editor::{KeyEvent, KeyKind, PointerEvent, PointerKind};
use crate::fit::FitPolicy;
use crate::model::{PageKey, Point, StrokeTool};
use eframe::egui;

use super::{AnnotatorApp, render};

impl eframe::App for AnnotatorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);
        self.top_bar(ctx);
        self.page_list(ctx);
        self.stage(ctx);
    }
}

impl AnnotatorApp {
    /// Escape and plain Enter end inline editing before the text field sees
    /// them; Shift+Enter falls through and inserts a newline.
    fn handle_keys(&mut self, ctx: &egui::Context) {
        if !self.editor.text_boxes().iter().any(|b| b.is_editing) {
            return;
        }
        let key = ctx.input_mut(|i| {
            let shift = i.modifiers.shift;
            if i.consume_key(egui::Modifiers::NONE, egui::Key::Escape) {
                Some(KeyEvent::new(KeyKind::Escape, shift))
            } else if !shift && i.consume_key(egui::Modifiers::NONE, egui::Key::Enter) {
                Some(KeyEvent::new(KeyKind::Enter, false))
            } else {
                None
            }
        });
        if let Some(key) = key {
            self.editor.handle_key(key);
        }
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Add page...").clicked() {
                    self.add_page_dialog();
                }
                if ui.button("Import segments...").clicked() {
                    self.import_segments_dialog();
                }
                ui.separator();

                let mut paint = self.editor.paint_mode();
                if ui.toggle_value(&mut paint, "Paint").changed() {
                    self.editor.set_paint_mode(paint);
                }
                ui.add_enabled_ui(paint, |ui| {
                    let brush = self.editor.brush();
                    if ui
                        .selectable_label(brush.tool == StrokeTool::Pen, "Pen")
                        .clicked()
                    {
                        self.editor.set_tool(StrokeTool::Pen);
                    }
                    if ui
                        .selectable_label(brush.tool == StrokeTool::Eraser, "Eraser")
                        .clicked()
                    {
                        self.editor.set_tool(StrokeTool::Eraser);
                    }
                    let mut width = brush.width;
                    let range = self.settings.brush_min..=self.settings.brush_max;
                    let response = ui.add(
                        egui::Slider::new(&mut width, range)
                            .step_by(self.settings.brush_step as f64)
                            .text("Brush"),
                    );
                    if response.changed() {
                        self.editor.set_brush_width(width);
                    }
                    if response.drag_stopped() || (response.changed() && !response.dragged()) {
                        self.persist_settings();
                    }
                    if ui.button("Clear mask").clicked() {
                        self.editor.clear_mask();
                    }
                });
                ui.separator();

                if ui.button("Export mask...").clicked() {
                    self.export_mask_dialog();
                }

                let mut policy = self.editor.fit_policy();
                egui::ComboBox::from_label("Fit")
                    .selected_text(match policy {
                        FitPolicy::Native => "Native",
                        FitPolicy::Letterbox => "Letterbox",
                    })
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut policy, FitPolicy::Native, "Native");
                        ui.selectable_value(&mut policy, FitPolicy::Letterbox, "Letterbox");
                    });
                if policy != self.editor.fit_policy() {
                    self.editor.set_fit_policy(policy);
                    self.persist_settings();
                }
            });
            if let Some(status) = &self.status {
                ui.label(status);
            }
        });
    }

    fn page_list(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("pages")
            .resizable(false)
            .default_width(160.0)
            .show(ctx, |ui| {
                ui.heading("Pages");
                let selected = self.editor.store().selected_page_key();
                let rows: Vec<(PageKey, String)> = self
                    .editor
                    .document()
                    .pages
                    .iter()
                    .map(|p| (p.key, p.name.clone()))
                    .collect();
                let can_delete = rows.len() > 1;
                let mut select = None;
                let mut delete = None;
                for (key, name) in &rows {
                    ui.horizontal(|ui| {
                        if ui.selectable_label(selected == Some(*key), name).clicked() {
                            select = Some(*key);
                        }
                        if ui
                            .add_enabled(can_delete, egui::Button::new("x").small())
                            .on_hover_text("Delete page")
                            .clicked()
                        {
                            delete = Some(*key);
                        }
                    });
                }
                if let Some(key) = select {
                    if let Err(e) = self.editor.select_page(key) {
                        self.status = Some(format!("Cannot select page: {e}"));
                    }
                }
                if let Some(key) = delete {
                    self.delete_page(key);
                }
            });
    }

    fn stage(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(source) = self.editor.selected_page().map(|p| p.source_image.clone()) else {
                ui.label("No page selected");
                return;
            };
            let image = self.ensure_image(ctx, &source);
            let mask = self.mask_texture(ctx);
            let geometry = self.editor.geometry();

            egui::ScrollArea::both().show(ui, |ui| {
                let size = egui::vec2(geometry.stage.width, geometry.stage.height);
                let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());
                let origin = rect.min;
                self.route_pointer(ctx, &response, origin);

                let painter = ui.painter_at(rect);
                render::draw_background(&painter, rect);
                match image {
                    Some(texture) => render::draw_image(&painter, origin, &geometry, texture),
                    None => render::draw_image_placeholder(&painter, origin, &geometry, &source),
                }
                if let Some(texture) = mask {
                    render::draw_mask(&painter, rect, texture);
                }
                render::draw_text_boxes(
                    &painter,
                    origin,
                    self.editor.text_boxes(),
                    self.editor.preview(),
                );
                self.inline_editor(ctx, ui, origin);
            });
        });
    }

    /// Turns this frame's pointer input over the stage into router events.
    fn route_pointer(&mut self, ctx: &egui::Context, response: &egui::Response, origin: egui::Pos2) {
        let to_stage = |p: egui::Pos2| Point::from_pos2((p - origin).to_pos2());
        let (pressed, released, press_origin, current, moved) = ctx.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.press_origin(),
                i.pointer.interact_pos(),
                i.pointer.delta() != egui::Vec2::ZERO,
            )
        });

        let mut events = Vec::new();
        if pressed && response.hovered() {
            if let Some(p) = press_origin.or(current) {
                self.pointer_down = true;
                events.push((PointerKind::Down, to_stage(p)));
            }
        }
        if self.pointer_down && moved && !pressed {
            if let Some(p) = current {
                events.push((PointerKind::Move, to_stage(p)));
            }
        }
        if self.pointer_down && released {
            self.pointer_down = false;
            if let Some(p) = current {
                events.push((PointerKind::Up, to_stage(p)));
            }
        }
        if let Some(p) = current {
            if response.clicked() {
                events.push((PointerKind::Click, to_stage(p)));
            }
            if response.double_clicked() {
                events.push((PointerKind::DoubleClick, to_stage(p)));
            }
        }

        for (kind, pos) in events {
            self.editor.handle_pointer(PointerEvent { kind, pos });
        }
    }

    fn inline_editor(&mut self, ctx: &egui::Context, ui: &egui::Ui, origin: egui::Pos2) {
        let Some(text_box) = self.editor.text_boxes().iter().find(|b| b.is_editing) else {
            return;
        };
        let key = text_box.key;
        let rect = text_box.bounds().translate(origin.to_vec2());
        let font_id = egui::FontId::proportional(text_box.font_size);
        let color = text_box.font_color.to_color32();
        let mut text = text_box.text.clone();
        let mut changed = false;

        egui::Area::new(ui.id().with("inline_text_edit"))
            .fixed_pos(rect.min)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                let frame = egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(255, 255, 255, 240))
                    .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(90, 160, 255)))
                    .inner_margin(4.0);
                frame.show(ui, |ui| {
                    ui.set_min_size(rect.size());
                    let response = ui.add(
                        egui::TextEdit::multiline(&mut text)
                            .desired_width(rect.width() - 8.0)
                            .font(font_id)
                            .text_color(color)
                            .frame(false),
                    );
                    changed = response.changed();
                    response.request_focus();
                });
            });

        if changed {
            self.editor.change_text(key, &text);
        }
    }
}
