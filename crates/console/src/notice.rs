use setup_admin_remote::redact_secrets;
use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Transient message for the operator, drained by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Error => "error",
        };
        write!(f, "[{tag}] {}", self.text)
    }
}

#[derive(Debug, Default)]
pub struct Notices {
    queue: VecDeque<Notice>,
}

impl Notices {
    pub fn push(&mut self, level: NoticeLevel, text: impl AsRef<str>) {
        let text = redact_secrets(text.as_ref());
        match level {
            NoticeLevel::Error => tracing::warn!("{text}"),
            _ => tracing::info!("{text}"),
        }
        self.queue.push_back(Notice { level, text });
    }

    pub fn success(&mut self, text: impl AsRef<str>) {
        self.push(NoticeLevel::Success, text);
    }

    pub fn error(&mut self, text: impl AsRef<str>) {
        self.push(NoticeLevel::Error, text);
    }

    pub fn info(&mut self, text: impl AsRef<str>) {
        self.push(NoticeLevel::Info, text);
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        self.queue.drain(..).collect()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.queue
            .iter()
            .rev()
            .find(|n| n.level == NoticeLevel::Error)
            .map(|n| n.text.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
