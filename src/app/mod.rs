//! Application runtime composition modules.

pub(crate) mod extract_command;
pub(crate) mod index_command;
pub(crate) mod runtime;
pub(crate) mod summary;
pub(crate) mod terminal;
