mod app;
mod message;

pub use app::{TrafficApp, Upload};
pub use message::Message;

use crate::config::TrafficConfig;
use crate::detection::ModelLoader;
use std::sync::Arc;

/// Open the single-page upload window
pub fn run(config: TrafficConfig) -> anyhow::Result<()> {
    let loader = Arc::new(ModelLoader::from_config(&config.model)?);

    iced::application(
        move || TrafficApp::new(config.clone(), loader.clone()),
        TrafficApp::update,
        TrafficApp::view,
    )
    .title("AI Traffic Checker")
    .run()
    .map_err(|e| anyhow::anyhow!("GUI failed: {}", e))
}
