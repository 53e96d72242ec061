//! Application state holding wgpu graphics context
//!
//! This module contains the graphics state (wgpu device, queue, surface) and
//! the domain state (camera, gesture engine, gallery, photo loader), plus the
//! per-frame update sequence and the egui UI.

use std::sync::Arc;
use std::time::Instant;

use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::camera::{CameraCapture, CameraFrame};
use crate::config::GalleryConfig;
use crate::gallery::{Gallery, PhotoView};
use crate::ml::{Classification, GestureEngine, HandLandmarkSet};
use crate::photos::PhotoLoader;
use crate::predict::ActionMapper;

/// Main application state
pub struct App {
    /// Reference to the window
    window: Arc<Window>,
    /// The wgpu surface for presenting rendered frames
    surface: wgpu::Surface<'static>,
    /// The wgpu device for creating GPU resources
    device: wgpu::Device,
    /// The command queue for submitting GPU work
    queue: wgpu::Queue,
    /// Surface configuration
    surface_config: wgpu::SurfaceConfiguration,
    /// Current window size in physical pixels
    size: PhysicalSize<u32>,

    // egui integration
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,

    // Camera capture
    camera: Option<CameraCapture>,
    camera_texture: Option<egui::TextureHandle>,
    last_camera_frame: u64,
    /// Latest unprocessed frame, consumed by the gesture step
    pending_frame: Option<CameraFrame>,

    // Gesture inference
    engine: GestureEngine,
    /// Hands detected in the most recent processed frame, for the overlay
    overlay_hands: Vec<HandLandmarkSet>,
    /// Most recent top classification, shown as the prediction text
    prediction: Option<Classification>,

    // Gallery
    gallery: Gallery,
    mapper: ActionMapper,
    /// Render projection, rebuilt only when the gallery mutates
    gallery_view: Vec<PhotoView>,
    /// Scroll the photo strip to the current photo on the next frame
    scroll_to_current: bool,

    // Photos
    photo_loader: PhotoLoader,
    photo_textures: Vec<Option<egui::TextureHandle>>,

    // Frame timing
    started: Instant,
    fps: f64,
    last_fps_update: Instant,
    frames_since_update: u64,
}

impl App {
    /// Create a new App instance with initialized wgpu context
    pub async fn new(window: Arc<Window>, settings: GalleryConfig) -> Self {
        let size = window.inner_size();

        // Create wgpu instance
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to find suitable GPU adapter");

        log::info!("Using GPU: {}", adapter.get_info().name);
        log::info!("Backend: {:?}", adapter.get_info().backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Gesture Gallery Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.limits(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .expect("Failed to create device");

        let surface_caps = surface.get_capabilities(&adapter);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 1,
        };

        surface.configure(&device, &surface_config);

        // Initialize egui
        let egui_ctx = egui::Context::default();
        let mut style = (*egui_ctx.style()).clone();
        style.visuals.window_shadow = egui::epaint::Shadow::NONE;
        egui_ctx.set_style(style);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        // Start loading models in the background; readiness gates inference
        let model_dir = settings
            .model_dir
            .clone()
            .or_else(crate::ml::find_model_dir)
            .unwrap_or_else(|| "models".into());
        let engine = GestureEngine::new(model_dir, settings.max_hands);

        // Gallery and photo downloads
        let gallery = Gallery::new(&settings.photos);
        let gallery_view = gallery.view();
        let mapper = ActionMapper::new(settings.scroll_cooldown_ms, settings.like_cooldown_ms);
        let photo_loader = PhotoLoader::start(settings.photos.clone());
        let photo_textures = vec![None; settings.photos.len()];
        let camera_index = settings.camera_index;

        let now = Instant::now();

        let mut app = Self {
            window,
            surface,
            device,
            queue,
            surface_config,
            size,
            egui_ctx,
            egui_state,
            egui_renderer,
            camera: None,
            camera_texture: None,
            last_camera_frame: 0,
            pending_frame: None,
            engine,
            overlay_hands: Vec::new(),
            prediction: None,
            gallery,
            mapper,
            gallery_view,
            scroll_to_current: true,
            photo_loader,
            photo_textures,
            started: now,
            fps: 60.0,
            last_fps_update: now,
            frames_since_update: 0,
        };

        app.connect_camera(camera_index);
        app
    }

    /// Handle a window event, returning true if egui consumed it
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(&self.window, event);
        response.consumed
    }

    /// Resize the surface
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.surface_config.width = new_size.width;
            self.surface_config.height = new_size.height;
            self.surface.configure(&self.device, &self.surface_config);
        }
    }

    /// Get current size
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Connect to a camera
    pub fn connect_camera(&mut self, camera_index: u32) {
        log::info!("Connecting to camera {}", camera_index);

        match CameraCapture::new(camera_index) {
            Ok(capture) => {
                self.camera = Some(capture);
                self.camera_texture = None;
                self.last_camera_frame = 0;
            }
            Err(e) => {
                // Without a camera the prediction loop never starts
                log::error!("Failed to connect camera: {}", e);
            }
        }
    }

    /// Disconnect the current camera
    pub fn disconnect_camera(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            camera.stop();
        }
        self.camera_texture = None;
        self.pending_frame = None;
        self.overlay_hands.clear();
        log::info!("Camera disconnected");
    }

    /// Poll the camera for a new frame and upload it for display
    pub fn update_camera(&mut self) {
        let Some(camera) = &self.camera else { return };
        let Some(frame) = camera.latest_frame() else { return };

        if self.camera_texture.is_some() && frame.frame_number <= self.last_camera_frame {
            return;
        }
        self.last_camera_frame = frame.frame_number;

        let image = egui::ColorImage::from_rgba_unmultiplied(
            [frame.width as usize, frame.height as usize],
            &frame.data,
        );

        match &mut self.camera_texture {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                log::info!("Camera stream is {}x{}", frame.width, frame.height);
                self.camera_texture = Some(self.egui_ctx.load_texture(
                    "webcam",
                    image,
                    egui::TextureOptions::LINEAR,
                ));
            }
        }

        self.pending_frame = Some(frame);
    }

    /// Poll the photo loader and upload any newly arrived photos
    pub fn update_photos(&mut self) {
        for photo in self.photo_loader.poll() {
            if photo.index >= self.photo_textures.len() {
                continue;
            }
            let image = egui::ColorImage::from_rgba_unmultiplied(
                [photo.width as usize, photo.height as usize],
                &photo.rgba,
            );
            self.photo_textures[photo.index] = Some(self.egui_ctx.load_texture(
                format!("photo-{}", photo.index),
                image,
                egui::TextureOptions::LINEAR,
            ));
        }
    }

    /// Run one prediction-loop iteration on the pending camera frame
    ///
    /// Detect hands, refresh the overlay, classify the first hand, and map
    /// the label to a gallery action. Inference errors are logged and the
    /// frame is skipped; the loop always continues.
    pub fn update_gesture(&mut self) {
        let Some(frame) = self.pending_frame.take() else { return };

        let gesture = match self.engine.process(&frame, frame.timestamp_ms) {
            Ok(g) => g,
            Err(e) => {
                log::warn!("Inference failed, skipping frame: {}", e);
                return;
            }
        };

        self.overlay_hands = gesture.hands;

        let Some(top) = gesture.classifications.first() else { return };
        self.prediction = Some(top.clone());

        let now_ms = self.started.elapsed().as_millis() as u64;
        if self.mapper.apply(&top.label, now_ms, &mut self.gallery) {
            self.refresh_gallery_view();
        }
    }

    /// Keyboard fallback: scroll to the previous photo
    pub fn scroll_up(&mut self) {
        self.gallery.retreat();
        self.refresh_gallery_view();
    }

    /// Keyboard fallback: scroll to the next photo
    pub fn scroll_down(&mut self) {
        self.gallery.advance();
        self.refresh_gallery_view();
    }

    /// Keyboard fallback: toggle like on the current photo
    pub fn toggle_like(&mut self) {
        self.gallery.toggle_like(self.gallery.current_index());
        self.refresh_gallery_view();
    }

    fn refresh_gallery_view(&mut self) {
        self.gallery_view = self.gallery.view();
        self.scroll_to_current = true;
    }

    /// Render one frame
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.render_ui(&mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        self.update_fps();

        Ok(())
    }

    fn render_ui(&mut self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let raw_input = self.egui_state.take_egui_input(&self.window);

        // Gather UI state before running egui
        let fps = self.fps;
        let camera_connected = self.camera.is_some();
        let camera_frame_count = self.camera.as_ref().map(|c| c.frame_count()).unwrap_or(0);
        let available_cameras = if camera_connected {
            Vec::new()
        } else {
            CameraCapture::list_cameras()
        };
        let model_ready = self.engine.is_ready();
        let prediction = self.prediction.clone();
        let camera_texture = self.camera_texture.clone();
        let overlay_hands = std::mem::take(&mut self.overlay_hands);
        let gallery_view = self.gallery_view.clone();
        let photo_textures = self.photo_textures.clone();
        let scroll_to_current = self.scroll_to_current;

        // Actions collected from the UI
        let mut connect_camera_index: Option<u32> = None;
        let mut disconnect_camera = false;
        let mut scroll_up = false;
        let mut scroll_down = false;
        let mut toggle_like = false;

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Gesture Gallery");
                    ui.separator();
                    ui.label(format!("FPS: {:.1}", fps));
                    ui.separator();
                    let prediction_text = match &prediction {
                        Some(c) => format!("{} ({:.1}%)", c.label, c.confidence * 100.0),
                        None => "-".to_string(),
                    };
                    ui.label(format!("Prediction: {}", prediction_text));
                });
            });

            egui::SidePanel::left("controls").show(ctx, |ui| {
                ui.heading("Camera");
                ui.separator();

                if camera_connected {
                    ui.label("Camera connected");
                    ui.label(format!("Frames: {}", camera_frame_count));
                    if ui.button("Disconnect (D)").clicked() {
                        disconnect_camera = true;
                    }
                } else if available_cameras.is_empty() {
                    ui.label("No cameras found");
                } else {
                    ui.label("Available cameras:");
                    for cam in &available_cameras {
                        if ui.button(format!("{}: {}", cam.index, cam.name)).clicked() {
                            connect_camera_index = Some(cam.index);
                        }
                    }
                }

                ui.separator();
                ui.heading("Model");
                if model_ready {
                    ui.label("Gesture model ready");
                } else {
                    ui.label("Loading gesture model...");
                }

                ui.separator();
                ui.heading("Gestures");
                ui.label("up - previous photo");
                ui.label("down - next photo");
                ui.label("like - toggle like");

                ui.separator();
                ui.heading("Keyboard");
                if ui.button("Previous (Up)").clicked() {
                    scroll_up = true;
                }
                if ui.button("Next (Down)").clicked() {
                    scroll_down = true;
                }
                if ui.button("Like (L)").clicked() {
                    toggle_like = true;
                }
            });

            egui::SidePanel::right("photo_list")
                .min_width(220.0)
                .show(ctx, |ui| {
                    ui.heading("Photos");
                    ui.separator();

                    egui::ScrollArea::vertical().show(ui, |ui| {
                        for photo in &gallery_view {
                            let stroke = if photo.active {
                                egui::Stroke::new(3.0, egui::Color32::LIGHT_BLUE)
                            } else {
                                egui::Stroke::new(1.0, egui::Color32::DARK_GRAY)
                            };

                            let frame = egui::Frame::group(ui.style()).stroke(stroke);
                            let response = frame
                                .show(ui, |ui| {
                                    let size = egui::Vec2::new(180.0, 240.0);
                                    match photo_textures.get(photo.index).and_then(|t| t.as_ref())
                                    {
                                        Some(texture) => {
                                            ui.add(egui::Image::new((texture.id(), size)));
                                        }
                                        None => {
                                            // Placeholder until the download lands
                                            let (rect, _) = ui
                                                .allocate_exact_size(size, egui::Sense::hover());
                                            ui.painter().rect_filled(
                                                rect,
                                                4.0,
                                                egui::Color32::from_gray(40),
                                            );
                                        }
                                    }
                                    ui.horizontal(|ui| {
                                        ui.label(format!("#{}", photo.index + 1));
                                        if photo.liked {
                                            ui.label(
                                                egui::RichText::new("\u{2764}")
                                                    .color(egui::Color32::RED),
                                            );
                                        }
                                    });
                                })
                                .response;

                            if photo.active && scroll_to_current {
                                response.scroll_to_me(Some(egui::Align::Center));
                            }
                        }
                    });
                });

            egui::CentralPanel::default().show(ctx, |ui| {
                match &camera_texture {
                    Some(texture) => {
                        // Fit the camera image to the panel, preserving aspect
                        let tex_size = texture.size_vec2();
                        let avail = ui.available_size();
                        let scale = (avail.x / tex_size.x).min(avail.y / tex_size.y).max(0.01);
                        let size = tex_size * scale;

                        let response = ui.add(egui::Image::new((texture.id(), size)));

                        // Overlay, cleared and redrawn every frame
                        crate::overlay::draw_hands(ui.painter(), response.rect, &overlay_hands);
                    }
                    None => {
                        ui.centered_and_justified(|ui| {
                            ui.label("No camera feed");
                        });
                    }
                }
            });
        });

        // Apply UI actions
        if let Some(idx) = connect_camera_index {
            self.connect_camera(idx);
        }
        if disconnect_camera {
            self.disconnect_camera();
        }
        if scroll_up {
            self.scroll_up();
        }
        if scroll_down {
            self.scroll_down();
        }
        if toggle_like {
            self.toggle_like();
        }

        self.overlay_hands = overlay_hands;
        self.scroll_to_current = false;

        self.egui_state
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.surface_config.width, self.surface_config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let render_pass_static: &mut wgpu::RenderPass<'static> =
                unsafe { std::mem::transmute(&mut render_pass) };

            self.egui_renderer
                .render(render_pass_static, &paint_jobs, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }

    fn update_fps(&mut self) {
        self.frames_since_update += 1;

        let now = Instant::now();
        let elapsed = now.duration_since(self.last_fps_update).as_secs_f64();
        if elapsed >= 1.0 {
            self.fps = self.frames_since_update as f64 / elapsed;
            self.frames_since_update = 0;
            self.last_fps_update = now;
        }
    }
}
