/// An error message destined for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    /// Underlying error text, if the notice was raised by a failure.
    pub detail: Option<String>,
}

/// Pending error notices, oldest first.
#[derive(Debug, Clone, Default)]
pub struct NoticeQueue {
    notices: Vec<Notice>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, title: impl Into<String>) {
        self.push(title.into(), None);
    }

    pub fn error_with(&mut self, title: impl Into<String>, detail: impl Into<String>) {
        self.push(title.into(), Some(detail.into()));
    }

    fn push(&mut self, title: String, detail: Option<String>) {
        self.notices.push(Notice { title, detail });
    }

    /// Removes and returns every queued notice, oldest first.
    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
