//! Everything between a game's bytes and the interactive controls a chat platform shows:
//! control tokens, the credential cipher, board rendering, and the two ways of running a
//! session (state carried in tokens, or held in process memory).

pub use cipher::*;
pub use control::*;
pub use error::*;
pub use render::*;
pub use session::*;
pub use settings::*;
pub use store::*;

mod cipher;
mod control;
mod error;
mod render;
mod session;
mod settings;
mod store;
