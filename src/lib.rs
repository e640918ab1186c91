pub mod api;
pub mod config;
pub mod counter;
pub mod db;
pub mod demo;
pub mod error;
pub mod markdown;
pub mod models;
pub mod panels;
pub mod services;
pub mod state;
pub mod supabase;
