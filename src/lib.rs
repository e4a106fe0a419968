pub mod app;
pub mod braille;
pub mod chart;
pub mod config;
pub mod data;
pub mod logging;
pub mod map;
pub mod mortality;
pub mod scale;
pub mod timeline;
pub mod ui;
