mod admin;
mod config;
mod error_disclosure;
mod harness;
mod plans;
mod server;
