//! UI components for the room.

pub mod messages;
