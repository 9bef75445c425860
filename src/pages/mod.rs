//! Top-level pages: the name gate and the room.

mod name_gate;
mod room;

pub use name_gate::NameGate;
pub use room::Room;
