//! CLI module for dealboard - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for rendering the board,
//! listing and creating deals, moving deals between stages, and seeding
//! demo data.

pub mod commands;

pub use commands::Cli;
