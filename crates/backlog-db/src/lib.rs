//! Database repositories for the backlog service

pub mod db;

pub use db::{ItemRepository, MIGRATOR};
