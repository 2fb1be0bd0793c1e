pub mod args;
pub mod combine;
pub mod config;
pub mod manifest;
pub mod noise;
pub mod stats;
