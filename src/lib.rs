//! Canvass: a door-to-door visit tracker that mirrors each visit as a
//! contact in a GoHighLevel CRM sub-account.

pub mod config;
pub mod crm;
pub mod db;
pub mod models;
pub mod server;
pub mod sync;
pub mod webhook;
