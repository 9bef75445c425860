//! Room components: message list, bubbles, attachments and the composer.

mod attachment_view;
mod message_bubble;
mod message_compose;
mod message_list;

pub use attachment_view::AttachmentPreview;
pub use message_bubble::MessageBubble;
pub use message_compose::MessageCompose;
pub use message_list::MessageList;
