pub mod anilist;
pub mod app;
pub mod config;
pub mod fetcher;
pub mod filter;
pub mod navigation;
pub mod query;
pub mod schedule;
pub mod season;
pub mod theme;
pub mod url_sync;
