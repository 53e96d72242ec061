//! Gesture Gallery - swipe through photos with hand gestures
//!
//! Captures webcam frames, detects hand landmarks, classifies the gesture,
//! and drives a photo gallery (scroll up, scroll down, toggle like) under
//! per-action cooldowns. Inference runs through ONNX Runtime; the UI is egui
//! on wgpu.

pub mod app;
pub mod camera;
pub mod config;
pub mod gallery;
pub mod ml;
pub mod overlay;
pub mod photos;
pub mod predict;

pub use app::App;
