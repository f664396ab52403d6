use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Order,
    Review,
    Follow,
    General,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::Order => "order",
            NoticeKind::Review => "review",
            NoticeKind::Follow => "follow",
            NoticeKind::General => "general",
        }
    }
}

/// A notification that a domain operation wants delivered. Drafts are
/// returned to the caller and persisted best-effort after the triggering
/// write commits; they are never part of that transaction.
#[derive(Debug, Clone)]
pub struct NoticeDraft {
    pub recipient: Uuid,
    pub kind: NoticeKind,
    pub message: String,
    pub link: Option<String>,
}

impl NoticeDraft {
    pub fn new(recipient: Uuid, kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            recipient,
            kind,
            message: message.into(),
            link: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}
