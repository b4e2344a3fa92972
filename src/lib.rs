//! Maintenance ticket desk: units file tickets, officers work them, units
//! review the work and admins watch the ratings.

pub mod config;
pub mod db;
pub mod desk;
pub mod duration;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod ratings;
pub mod store;
pub mod views;
pub mod wire;
