//! Identity gate.
//!
//! A device holds at most one display name. The gate reads it on open and
//! either lets the user straight into the room or asks for a name. Anyone may
//! claim any name; there is no account behind it.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{ChatError, ChatResult};
use crate::storage::Storage;

/// Maximum display name length in characters
pub const MAX_NAME_CHARS: usize = 30;

/// Author name used for messages sent by guests
pub const GUEST_AUTHOR: &str = "Guest";

/// A validated display name: trimmed, 1 to 30 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayName(String);

impl DisplayName {
    /// Trim and validate raw input.
    pub fn parse(raw: &str) -> ChatResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ChatError::InvalidName("name cannot be empty".to_string()));
        }
        if trimmed.chars().count() > MAX_NAME_CHARS {
            return Err(ChatError::InvalidName(format!(
                "name cannot exceed {} characters",
                MAX_NAME_CHARS
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who is sitting in the room.
///
/// Passed explicitly to the room and composer instead of being read from
/// storage deep inside them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// A named participant
    Named(DisplayName),
    /// Browsing without a name
    Guest,
}

impl Session {
    /// The viewer's name, used for ownership checks. Guests have none.
    pub fn viewer_name(&self) -> Option<&str> {
        match self {
            Session::Named(name) => Some(name.as_str()),
            Session::Guest => None,
        }
    }

    /// Name written into the `username` column when sending.
    pub fn author_name(&self) -> &str {
        match self {
            Session::Named(name) => name.as_str(),
            Session::Guest => GUEST_AUTHOR,
        }
    }

    /// Whether this is a guest session
    pub fn is_guest(&self) -> bool {
        matches!(self, Session::Guest)
    }
}

/// Durable key-value slot for the display name
pub trait IdentityStore: Send + Sync {
    /// Read the persisted name, if any
    fn load(&self) -> ChatResult<Option<String>>;
    /// Persist a name
    fn save(&self, name: &str) -> ChatResult<()>;
    /// Forget the persisted name
    fn clear(&self) -> ChatResult<()>;
}

impl IdentityStore for Storage {
    fn load(&self) -> ChatResult<Option<String>> {
        self.load_display_name()
    }

    fn save(&self, name: &str) -> ChatResult<()> {
        self.save_display_name(name)
    }

    fn clear(&self) -> ChatResult<()> {
        self.clear_display_name()
    }
}

impl<S: IdentityStore + ?Sized> IdentityStore for Arc<S> {
    fn load(&self) -> ChatResult<Option<String>> {
        (**self).load()
    }

    fn save(&self, name: &str) -> ChatResult<()> {
        (**self).save(name)
    }

    fn clear(&self) -> ChatResult<()> {
        (**self).clear()
    }
}

/// In-memory identity slot, for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    name: parking_lot::Mutex<Option<String>>,
}

impl MemoryIdentityStore {
    /// Create a store pre-populated with a name
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: parking_lot::Mutex::new(Some(name.into())),
        }
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&self) -> ChatResult<Option<String>> {
        Ok(self.name.lock().clone())
    }

    fn save(&self, name: &str) -> ChatResult<()> {
        *self.name.lock() = Some(name.to_string());
        Ok(())
    }

    fn clear(&self) -> ChatResult<()> {
        *self.name.lock() = None;
        Ok(())
    }
}

/// Gate state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    /// Waiting for the user to pick a name or continue as guest
    Prompt,
    /// In the room
    Entered(Session),
}

/// The name-entry gate in front of the room
pub struct IdentityGate<S: IdentityStore> {
    store: S,
    state: GateState,
}

impl<S: IdentityStore> IdentityGate<S> {
    /// Open the gate, skipping the prompt if a valid name is already stored.
    ///
    /// A stored value that fails validation, or a store that cannot be read,
    /// falls back to the prompt.
    pub fn open(store: S) -> Self {
        let state = match store.load() {
            Ok(Some(raw)) => match DisplayName::parse(&raw) {
                Ok(name) => {
                    info!(name = %name, "Restored display name");
                    GateState::Entered(Session::Named(name))
                }
                Err(e) => {
                    warn!(error = %e, "Ignoring invalid stored display name");
                    GateState::Prompt
                }
            },
            Ok(None) => GateState::Prompt,
            Err(e) => {
                warn!(error = %e, "Failed to read stored display name");
                GateState::Prompt
            }
        };
        Self { store, state }
    }

    /// Current state
    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// The active session, if the gate has been passed
    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            GateState::Entered(session) => Some(session),
            GateState::Prompt => None,
        }
    }

    /// Submit a name: validate, persist, enter the room.
    ///
    /// On any error the gate stays where it was.
    pub fn submit(&mut self, raw: &str) -> ChatResult<Session> {
        let name = DisplayName::parse(raw)?;
        self.store.save(name.as_str())?;
        info!(name = %name, "Display name saved");
        let session = Session::Named(name);
        self.state = GateState::Entered(session.clone());
        Ok(session)
    }

    /// Enter the room without a name. Nothing is persisted.
    pub fn continue_as_guest(&mut self) -> Session {
        info!("Entering as guest");
        self.state = GateState::Entered(Session::Guest);
        Session::Guest
    }

    /// Forget the stored name and go back to the prompt.
    pub fn reset(&mut self) -> ChatResult<()> {
        self.store.clear()?;
        self.state = GateState::Prompt;
        Ok(())
    }
}
