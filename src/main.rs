use page_annotator::AnnotatorApp;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1200.0, 900.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Page Annotator",
        native_options,
        Box::new(|cc| Ok(Box::new(AnnotatorApp::new(cc)))),
    )
}
