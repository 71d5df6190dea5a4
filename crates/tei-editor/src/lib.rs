//! Subcommands of the `tei-editor` binary.

pub mod commands;
