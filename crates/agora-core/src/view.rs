//! Message list view model.
//!
//! A pure function from the room state to what each row shows. The desktop
//! shell renders these; the CLI prints them.

use std::collections::HashSet;

use crate::attachment::{format_bytes, AttachmentKind};
use crate::message::Message;

/// Which side of the list a row sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Viewer's own messages
    Right,
    /// Everyone else
    Left,
}

/// What an attachment shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentView {
    pub url: String,
    pub name: String,
    pub mime: String,
    pub kind: AttachmentKind,
    /// Human-readable size, e.g. `1.46 KB`
    pub size_label: String,
}

/// One rendered row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub id: String,
    pub alignment: Alignment,
    /// Author label, shown on other people's messages only
    pub author_label: Option<String>,
    pub body: String,
    /// Local `HH:mm`
    pub time_label: String,
    pub attachment: Option<AttachmentView>,
    /// Copy is offered only when there is text to copy
    pub can_copy: bool,
    pub can_delete: bool,
    /// Plays the entrance animation
    pub is_new: bool,
}

impl MessageView {
    pub fn is_own(&self) -> bool {
        self.alignment == Alignment::Right
    }
}

/// Render the list.
///
/// `can_delete` says whether the caller offers deletion at all; it is then
/// granted only on the viewer's own messages. Guests (`viewer == None`) own
/// nothing.
pub fn render_messages(
    messages: &[Message],
    viewer: Option<&str>,
    recent: &HashSet<String>,
    can_delete: bool,
) -> Vec<MessageView> {
    messages
        .iter()
        .map(|message| {
            let own = message.is_authored_by(viewer);
            MessageView {
                id: message.id.clone(),
                alignment: if own { Alignment::Right } else { Alignment::Left },
                author_label: (!own).then(|| message.username.clone()),
                body: message.body.clone(),
                time_label: message.time_label(),
                attachment: message.attachment.as_ref().map(|a| AttachmentView {
                    url: a.url.clone(),
                    name: a.name.clone(),
                    mime: a.mime.clone(),
                    kind: AttachmentKind::of(&a.mime),
                    size_label: format_bytes(a.size),
                }),
                can_copy: !message.body.is_empty(),
                can_delete: can_delete && own,
                is_new: recent.contains(&message.id),
            }
        })
        .collect()
}
