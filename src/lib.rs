#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod api;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod entities;
pub mod error;
pub mod transform;

mod render;
