pub mod accounts;
pub mod app;
pub mod config;
pub mod db;
pub mod state;
