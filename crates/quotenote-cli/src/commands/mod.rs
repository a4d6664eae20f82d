pub mod add;
pub mod auth_cmd;
pub mod common;
pub mod completions;
pub mod config;
pub mod delete;
pub mod edit;
pub mod interface;
pub mod list;
pub mod migrate;
pub mod random;
pub mod show;
pub mod tags;
