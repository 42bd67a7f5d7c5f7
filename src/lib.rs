//! RSS services
//!
//! Two small HTTP services sharing this crate: a blog feed that renders
//! posts from SQLite as RSS 2.0, and an aggregator that fetches several
//! external feeds concurrently and re-serves their merged items.

pub mod config;
pub mod db;
pub mod feed;
pub mod fetcher;
pub mod routes;
