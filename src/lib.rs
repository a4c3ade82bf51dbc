//! A command line time tracker. Work is recorded as a ledger of days, each holding named
//! activities made of start/stop intervals with notes and tags, and is kept in a single sheet
//! file.
//!

pub mod cli;
pub mod config;
pub mod error;
pub mod space;
pub mod storage;
pub mod store;
pub mod utils;
