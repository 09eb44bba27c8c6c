//! Conversion from teloxide messages to the core's message model.

use teloxide::types::{Message, User};

use bvs_core::{
    domain::{UserId, UserProfile},
    messaging::types::{MediaKind, MessageContent},
};

pub fn profile_of(user: &User) -> UserProfile {
    UserProfile::new(
        UserId(user.id.0 as i64),
        user.username.clone(),
        Some(user.first_name.clone()),
    )
}

/// Text, one of the relayable media kinds, or `Unsupported`.
///
/// Photos use the largest size Telegram offers.
pub fn message_content(msg: &Message) -> MessageContent {
    if let Some(text) = msg.text() {
        return MessageContent::Text(text.to_string());
    }

    let media = if let Some(sizes) = msg.photo() {
        sizes.last().map(|p| (MediaKind::Photo, p.file.id.clone()))
    } else if let Some(v) = msg.voice() {
        Some((MediaKind::Voice, v.file.id.clone()))
    } else if let Some(v) = msg.video() {
        Some((MediaKind::Video, v.file.id.clone()))
    } else {
        msg.document()
            .map(|d| (MediaKind::Document, d.file.id.clone()))
    };

    match media {
        Some((kind, file_id)) => MessageContent::Media {
            kind,
            file_id,
            caption: msg.caption().map(str::to_string),
        },
        None => MessageContent::Unsupported,
    }
}
