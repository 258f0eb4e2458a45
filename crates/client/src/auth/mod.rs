//! Authentication: persisted credential pair and session lifecycle

mod session;
mod tokens;

pub use session::{Profile, Registration, SessionState, SessionStore};
pub use tokens::{TokenPair, TokenStore, TOKENS_FILE};
