use env_logger::Env;
use flowsheet_editor::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    // Default to info; egui itself is noisy below warn
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("egui", log::LevelFilter::Warn)
        .init();

    let config = AppConfig::from_env();
    let result = flowsheet_editor::run_app(config);
    if let Err(err) = &result {
        log::error!("Application exited with an error: {err}");
    }
    result
}
