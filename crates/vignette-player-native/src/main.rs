mod app;
mod audio_backend;
mod player;
mod ui;

use anyhow::anyhow;
use log::warn;
use vignette_core::PlayerConfig;

const CONFIG_FILE: &str = "vignette-player.json";

fn load_config() -> PlayerConfig {
    match std::fs::read_to_string(CONFIG_FILE) {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(config) => config,
            Err(e) => {
                warn!("ignoring malformed {CONFIG_FILE}: {e}");
                PlayerConfig::default()
            }
        },
        Err(_) => PlayerConfig::default(),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = load_config();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 640.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Vignette Player",
        options,
        Box::new(|_cc| Box::new(app::VignettePlayerApp::new(config))),
    )
    .map_err(|e| anyhow!("failed to start ui: {e}"))
}
