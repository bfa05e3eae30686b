//! Editing commands for the journal post editor.
//!
//! [`JournalEditor`] turns toolbar, shortcut, typing and paste intents into
//! changes on a [`journaly_document::Editor`]. User interaction the commands
//! depend on (the link prompt, the image picker, error toasts) goes through
//! a [`Host`].

mod command;
mod dispatch;
mod error;
mod host;
mod image;
mod link;
mod locale;
mod settings;

pub use crate::command::*;
pub use crate::dispatch::*;
pub use crate::error::*;
pub use crate::host::*;
pub use crate::image::*;
pub use crate::link::*;
pub use crate::locale::*;
pub use crate::settings::*;
