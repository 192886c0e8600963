//! Chat widget: conversation state, rendering and session control.

pub mod composer;
pub mod history;
pub mod scroll;
pub mod session;
pub mod store;

pub use composer::{ChatComposer, ComposerResult};
pub use scroll::ScrollSync;
pub use session::{ChatSession, Visibility};
pub use store::{ConversationStore, Message, Sender, FALLBACK_TEXT, WELCOME_HTML};
