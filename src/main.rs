//! Gesture Gallery - Main Entry Point
//!
//! Opens the window, drives redraws at a fixed frame rate, and forwards
//! keyboard fallbacks to the app. Each redraw runs one prediction-loop
//! iteration: poll camera, poll photos, detect and classify, render.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gesture_gallery::config::GalleryConfig;
use gesture_gallery::App;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

const WINDOW_TITLE: &str = "Gesture Gallery";
const DEFAULT_WIDTH: u32 = 1280;
const DEFAULT_HEIGHT: u32 = 720;
const TARGET_FPS: u32 = 30;

/// Application state machine
enum AppState {
    /// Initial state before window is created
    Uninitialized,
    /// Window and graphics context are ready
    Running { window: Arc<Window>, app: App },
}

/// Main application handler implementing winit's ApplicationHandler trait
struct GestureGalleryApp {
    state: AppState,
    next_redraw_at: Instant,
}

impl GestureGalleryApp {
    fn new() -> Self {
        Self {
            state: AppState::Uninitialized,
            next_redraw_at: Instant::now(),
        }
    }
}

impl ApplicationHandler for GestureGalleryApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Only initialize if we haven't already
        if let AppState::Uninitialized = &self.state {
            log::info!("Creating window...");

            let window_attributes = WindowAttributes::default()
                .with_title(WINDOW_TITLE)
                .with_inner_size(LogicalSize::new(DEFAULT_WIDTH, DEFAULT_HEIGHT));

            let window = Arc::new(
                event_loop
                    .create_window(window_attributes)
                    .expect("Failed to create window"),
            );

            log::info!("Initializing wgpu and egui...");
            let settings = GalleryConfig::load_or_default();
            let app = pollster::block_on(App::new(window.clone(), settings));

            log::info!("Gesture Gallery ready!");
            log::info!("Gestures: up / down scroll, like toggles the heart");
            log::info!("Keys: arrows scroll, L likes, C/D camera, ESC exits");

            self.state = AppState::Running { window, app };
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let AppState::Running { window, app } = &mut self.state else {
            return;
        };

        // Let egui handle the event first
        let egui_consumed = app.handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting...");
                event_loop.exit();
            }

            // Keyboard input (only if egui doesn't want it)
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } if !egui_consumed => {
                match key_code {
                    KeyCode::Escape => {
                        log::info!("Escape pressed, exiting...");
                        event_loop.exit();
                    }
                    KeyCode::F11 => {
                        if window.fullscreen().is_some() {
                            window.set_fullscreen(None);
                        } else {
                            window.set_fullscreen(Some(winit::window::Fullscreen::Borderless(
                                None,
                            )));
                        }
                    }
                    // Arrow keys mirror the scroll gestures
                    KeyCode::ArrowUp => app.scroll_up(),
                    KeyCode::ArrowDown => app.scroll_down(),
                    // L mirrors the like gesture
                    KeyCode::KeyL => app.toggle_like(),
                    // C to connect camera 0, D to disconnect
                    KeyCode::KeyC => app.connect_camera(0),
                    KeyCode::KeyD => app.disconnect_camera(),
                    _ => {}
                }
            }

            WindowEvent::Resized(physical_size) => {
                app.resize(physical_size);
            }

            WindowEvent::RedrawRequested => {
                // One prediction-loop iteration; detect and classify finish
                // inside update_gesture before the next frame is scheduled
                app.update_camera();
                app.update_photos();
                app.update_gesture();

                match app.render() {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        log::warn!("Surface lost, reconfiguring...");
                        app.resize(app.size());
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of GPU memory!");
                        event_loop.exit();
                    }
                    Err(e) => {
                        log::warn!("Surface error: {:?}", e);
                    }
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Running { window, .. } = &mut self.state else {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        };

        // Drive redraws at target FPS
        let frame_duration = Duration::from_nanos(1_000_000_000u64 / TARGET_FPS as u64);
        let now = Instant::now();

        if now >= self.next_redraw_at {
            window.request_redraw();
            self.next_redraw_at += frame_duration;

            // Reset if too far behind
            if now > self.next_redraw_at + frame_duration * 2 {
                self.next_redraw_at = now + frame_duration;
            }
        }

        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_redraw_at));
    }
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Gesture Gallery v0.1.0");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = GestureGalleryApp::new();
    event_loop.run_app(&mut app).expect("Event loop error");
}
