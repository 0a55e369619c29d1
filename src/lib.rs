pub mod app;
pub mod assets;
pub mod config;
pub mod core;
pub mod game;
pub mod screens;
pub mod stage;
