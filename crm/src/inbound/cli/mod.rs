//! Terminal adapter: login prompt, role menus and command forms.
//!
//! - [`menu`] walks the role-specific menus.
//! - [`router`] maps selections to commands.
//! - [`commands`] collects forms and calls the domain services.
//! - [`session_loop`] ties login, menus and logout together.

pub mod commands;
pub mod forms;
pub mod menu;
pub mod render;
pub mod router;
pub mod session_loop;
mod terminal;

pub use commands::ConsoleCommands;
pub use menu::{Catalogue, MenuItem, MenuNavigator, MenuState, Selection, SubmenuKey};
pub use router::{Command, CommandHandler, CommandRouter, Domain, Outcome};
pub use session_loop::SessionLoop;
pub use terminal::{StdTerminal, Terminal};
