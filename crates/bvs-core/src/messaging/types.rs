/// Kinds of media the bridge can carry by file reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Photo,
    Voice,
    Video,
    Document,
}

/// Transcript/placeholder label per media kind, indexed by discriminant.
const MEDIA_LABELS: [&str; 4] = ["[Photo]", "[Voice]", "[Video]", "[Document]"];

pub const UNSUPPORTED_LABEL: &str = "[Unsupported]";

impl MediaKind {
    pub fn placeholder(self) -> &'static str {
        MEDIA_LABELS[self as usize]
    }
}

/// One logical message crossing the bridge, in either direction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    Media {
        kind: MediaKind,
        /// Platform file reference; re-sent as-is, never downloaded.
        file_id: String,
        caption: Option<String>,
    },
    Unsupported,
}

impl MessageContent {
    /// What goes into the transcript: the literal text, or a fixed label.
    pub fn summary(&self) -> &str {
        match self {
            MessageContent::Text(t) => t,
            MessageContent::Media { kind, .. } => kind.placeholder(),
            MessageContent::Unsupported => UNSUPPORTED_LABEL,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaAttachment {
    pub kind: MediaKind,
    pub file_id: String,
}

/// A formatted message ready to send: HTML body, optionally riding on a media
/// attachment as its caption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    pub html: String,
    pub media: Option<MediaAttachment>,
}

impl Envelope {
    pub fn text(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            media: None,
        }
    }

    pub fn with_media(html: impl Into<String>, kind: MediaKind, file_id: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            media: Some(MediaAttachment {
                kind,
                file_id: file_id.into(),
            }),
        }
    }
}

/// Inline keyboard (buttons) used for the "create ticket" prompt.
#[derive(Clone, Debug)]
pub struct InlineKeyboard {
    pub buttons: Vec<InlineButton>,
}

#[derive(Clone, Debug)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineKeyboard {
    pub fn single(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            buttons: vec![InlineButton {
                label: label.into(),
                callback_data: callback_data.into(),
            }],
        }
    }
}

/// Capabilities / limits of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub max_message_len: usize,
    pub max_caption_len: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_table_matches_kinds() {
        assert_eq!(MediaKind::Photo.placeholder(), "[Photo]");
        assert_eq!(MediaKind::Voice.placeholder(), "[Voice]");
        assert_eq!(MediaKind::Video.placeholder(), "[Video]");
        assert_eq!(MediaKind::Document.placeholder(), "[Document]");
    }

    #[test]
    fn summary_uses_text_or_label() {
        assert_eq!(MessageContent::Text("hi".into()).summary(), "hi");
        let media = MessageContent::Media {
            kind: MediaKind::Video,
            file_id: "f".into(),
            caption: Some("look".into()),
        };
        assert_eq!(media.summary(), "[Video]");
        assert_eq!(MessageContent::Unsupported.summary(), "[Unsupported]");
    }
}
