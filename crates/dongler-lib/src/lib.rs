//! dongler — vendor-command control of USB DAC/amp dongles
//! (Moondrop Dawn family, FiiO KA5/KA13, E1DA #9038SG3).

pub mod commands;
pub mod config;
pub mod controller;
pub mod device;
pub mod dongle;
pub mod error;
pub mod feature;
pub mod models;
pub mod monitor;
pub mod profile;
pub mod protocol;
pub mod reconnect;
pub mod repository;
pub mod setting;
pub mod transfer;

pub use error::DonglerError;
