//! Per-session conversation state.

use fitcoach_core::types::{Message, Profile};
use fitcoach_knowledge::{SharedScope, scope::shared_scope};

/// One chat session: ordered history, the user's profile, the session's
/// retrieval scope, and whether web corroboration is enabled. Created per
/// session and discarded when it ends; nothing here is shared across
/// sessions except through explicit handles.
pub struct SessionContext {
    pub messages: Vec<Message>,
    pub profile: Profile,
    pub scope: SharedScope,
    pub use_web: bool,
}

impl SessionContext {
    pub fn new(profile: Profile, use_web: bool) -> Self {
        Self { messages: Vec::new(), profile, scope: shared_scope(), use_web }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }
}
