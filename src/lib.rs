pub mod config;
pub mod events;
pub mod gui;
pub mod scene;
pub mod sys;
