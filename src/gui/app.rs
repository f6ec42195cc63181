use iced::widget::{button, column, container, scrollable, text};
use iced::{Color, Element, Length, Task};
use rfd::AsyncFileDialog;
use std::path::Path;
use std::sync::Arc;
use tracing::error;

use super::Message;
use crate::annotate::Annotator;
use crate::config::TrafficConfig;
use crate::detection::ModelLoader;
use crate::models::TrafficReport;
use crate::pipeline::{self, ACCEPTED_EXTENSIONS, TrafficPipeline};
use crate::report;

/// One analysed upload, ready to display
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub image: iced::widget::image::Handle,
    pub report: TrafficReport,
}

pub struct TrafficApp {
    config: TrafficConfig,
    loader: Arc<ModelLoader>,
    annotator: Annotator,
    busy: bool,
    upload: Option<Upload>,
    error: Option<String>,
}

impl TrafficApp {
    pub fn new(config: TrafficConfig, loader: Arc<ModelLoader>) -> Self {
        // Font lookup happens once per window, not once per upload
        let annotator = Annotator::new(&config);
        Self {
            config,
            loader,
            annotator,
            busy: false,
            upload: None,
            error: None,
        }
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickImage => {
                self.busy = true;
                let job = AnalyzeJob {
                    config: self.config.clone(),
                    loader: self.loader.clone(),
                    annotator: self.annotator.clone(),
                };
                Task::perform(pick_and_analyze(job), Message::Analyzed)
            }
            Message::Analyzed(None) => {
                self.busy = false;
                Task::none()
            }
            Message::Analyzed(Some(result)) => {
                self.busy = false;
                // Every upload replaces the previous page wholesale
                match result {
                    Ok(upload) => {
                        self.upload = Some(upload);
                        self.error = None;
                    }
                    Err(message) => {
                        error!("{}", message);
                        self.upload = None;
                        self.error = Some(message);
                    }
                }
                Task::none()
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let mut content = column![
            text("AI Traffic Checker").size(32),
            text(
                "Upload a traffic image to check congestion level and emergency vehicle detection."
            ),
            button("Upload Traffic Image")
                .on_press_maybe((!self.busy).then_some(Message::PickImage)),
        ]
        .spacing(20)
        .padding(20);

        if self.busy {
            content = content.push(text("Analysing..."));
        }

        if let Some(message) = &self.error {
            content = content.push(text(message.clone()).color(Color::from_rgb(0.9, 0.2, 0.2)));
        }

        if let Some(upload) = &self.upload {
            content = content
                .push(iced::widget::image(upload.image.clone()).width(Length::Fill))
                .push(text(format!("Detected Traffic: {}", upload.file_name)))
                .push(text(report::status_line(&upload.report)).size(24))
                .push(text(report::count_line(&upload.report)));

            for advisory in &upload.report.advisories {
                let line = format!("[{}] {}", advisory.level(), advisory.message());
                content = content.push(text(line));
            }
        }

        container(scrollable(content))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

/// Everything one upload needs, moved onto the blocking pool
struct AnalyzeJob {
    config: TrafficConfig,
    loader: Arc<ModelLoader>,
    annotator: Annotator,
}

async fn pick_and_analyze(job: AnalyzeJob) -> Option<Result<Upload, String>> {
    let file = AsyncFileDialog::new()
        .add_filter("Traffic Image", &ACCEPTED_EXTENSIONS)
        .pick_file()
        .await?;

    let file_name = file.file_name();
    let bytes = file.read().await;

    // Model loading and inference are CPU-bound; keep them off the executor
    let result = tokio::task::spawn_blocking(move || analyze(job, file_name, &bytes))
        .await
        .map_err(|e| format!("analysis task failed: {}", e))
        .and_then(|result| result.map_err(|e| e.to_string()));
    Some(result)
}

fn analyze(job: AnalyzeJob, file_name: String, bytes: &[u8]) -> crate::Result<Upload> {
    pipeline::validate_extension(Path::new(&file_name))?;

    let detector = job.loader.load()?;
    let output = TrafficPipeline::with_annotator(detector, job.config, job.annotator).run(bytes)?;

    let (width, height) = output.annotated.dimensions();
    let rgba = image::DynamicImage::ImageRgb8(output.annotated)
        .to_rgba8()
        .into_raw();

    Ok(Upload {
        file_name,
        image: iced::widget::image::Handle::from_rgba(width, height, rgba),
        report: output.report,
    })
}
