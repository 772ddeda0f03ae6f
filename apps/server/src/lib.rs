//! Sketchy server library.
//!
//! This library provides the core functionality for the sketch-to-website
//! server, including database operations, authentication, generation and
//! the saved-site gallery.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
