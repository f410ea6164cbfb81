//! Host system adapters

mod path_lookup;
mod process;

pub use path_lookup::PathLookup;
pub use process::detached_command;
