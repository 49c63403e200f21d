mod action;
mod document;
mod error;
mod event;
mod gateway;
mod outcome;
mod session;
mod settings;
mod slash_commands;
mod turn;
mod view;

pub use action::*;
pub use document::*;
pub use error::*;
pub use event::*;
pub use gateway::*;
pub use outcome::*;
pub use session::*;
pub use settings::*;
pub use slash_commands::*;
pub use turn::*;
pub use view::*;
