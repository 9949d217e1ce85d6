//! Santabot - the two Telegram bots of the Secret Santa event
//!
//! The user bot walks participants through registration; the admin bot lets the
//! organiser browse, fix and export what was collected. Both share one SQLite
//! store from `santacore`.

pub mod cli;
pub mod i18n;
pub mod telegram;
