//! This is intended to serve as a binary crate.
//!
//! Fetches every App Store toplist feed of the day once and stores it under
//! `<root>/<list>/<YYYY>/<MM>/<DD>/<country>.json`.
pub mod config;
pub mod driver;
pub mod fetch;
pub mod io;
pub mod target;
