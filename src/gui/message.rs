use super::Upload;

#[derive(Debug, Clone)]
pub enum Message {
    /// Upload button pressed
    PickImage,
    /// Dialog closed; `None` when the user cancelled
    Analyzed(Option<Result<Upload, String>>),
}
