//! Shop front-end build pipeline.
//!
//! Reads a shop's `config_<id>.json`, writes the LESS entry manifest, and
//! drives `lessc`, `postcss`, `cleancss`, `uglifyjs` and `eslint` through a
//! dependency-ordered task graph, with a watch mode that rebuilds on change.
//!
//! - **[`config`]** and **[`manifest`]**: load the shop and derive paths,
//!   variables and the generated entry file
//! - **[`tasks`]**: named build steps and their dependency graph
//! - **[`commands`]**: subcommand orchestration and task scheduling
//! - **[`watch`]**: maps source changes to the tasks that rebuild them
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod manifest;
pub mod notification;
pub mod sources;
pub mod tasks;
pub mod watch;
