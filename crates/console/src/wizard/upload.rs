/// Progress reported by the key-file upload widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    Uploading { name: String },
    Done { name: String },
    Failed { name: String },
}
