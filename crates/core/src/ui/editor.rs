//! Main editor window.
//!
//! This module contains the `ImageEditorApp` struct which implements the
//! `eframe::App` trait: an input column (image, prompt, generate button) and
//! an output column with the original and edited previews.

use super::rendering::{draw_error_banner, draw_preview, load_texture};
use super::state::EditEvent;
use crate::codec::UploadedImage;
use crate::config::Config;
use crate::error::{AppError, Result, ValidationError};
use crate::gemini::GeminiClient;
use crate::pipeline::EditPipeline;
use crate::session::{PendingEdit, Session};
use eframe::egui;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

const PREVIEW_HEIGHT: f32 = 360.0;

/// The editor application.
pub struct ImageEditorApp {
    // Session state
    session: Session,
    pipeline: EditPipeline,

    // Form inputs
    path_input: String,
    prompt_input: String,

    // Preview textures, rebuilt when the session's previews change
    original_texture: Option<egui::TextureHandle>,
    edited_texture: Option<egui::TextureHandle>,
    textures_dirty: bool,

    // Worker channel
    rx: Receiver<EditEvent>,
    tx: Sender<EditEvent>,
}

impl ImageEditorApp {
    /// Creates a new editor window state around `pipeline`.
    pub fn new(pipeline: EditPipeline) -> Self {
        let (tx, rx) = channel();
        Self {
            session: Session::new(),
            pipeline,
            path_input: String::new(),
            prompt_input: String::new(),
            original_texture: None,
            edited_texture: None,
            textures_dirty: false,
            rx,
            tx,
        }
    }

    /// Reads an image from disk and offers it to the session.
    fn load_path(&mut self, path: &Path) {
        let outcome = UploadedImage::from_path(path).and_then(|image| self.session.select_image(image));
        self.apply_selection_outcome(outcome);
    }

    /// Offers a file dropped onto the window.
    fn load_dropped(&mut self, file: &egui::DroppedFile) {
        if let Some(path) = &file.path {
            self.path_input = path.display().to_string();
            self.load_path(path);
            return;
        }

        let outcome = match &file.bytes {
            Some(bytes) => UploadedImage::from_bytes(file.name.clone(), bytes.to_vec(), &file.mime)
                .and_then(|image| self.session.select_image(image)),
            None => Err(AppError::read(format!("{}: no file content", file.name))),
        };
        self.apply_selection_outcome(outcome);
    }

    fn apply_selection_outcome(&mut self, outcome: Result<()>) {
        match outcome {
            Ok(()) => {}
            // Already recorded by the session
            Err(AppError::Validation(ValidationError::ImageTooLarge { .. }))
            | Err(AppError::RequestInFlight) => {}
            Err(e) => {
                let _ = self.session.reject_selection(&e);
            }
        }
        self.textures_dirty = true;
    }

    /// Starts an edit on a background thread.
    ///
    /// Spawns a thread with its own runtime for the API call and sends the
    /// outcome back through the channel.
    fn submit_request(&mut self, ctx: &egui::Context) {
        let pending = match self.session.submit() {
            Ok(pending) => pending,
            Err(_) => {
                // Validation message (if any) is already in the session
                self.textures_dirty = true;
                return;
            }
        };
        self.textures_dirty = true;

        let tx = self.tx.clone();
        let pipeline = self.pipeline.clone();
        let ctx = ctx.clone();

        thread::spawn(move || {
            let event = run_pending(pending, &pipeline);
            let _ = tx.send(event);
            ctx.request_repaint();
        });
    }

    /// Applies finished edits from the worker thread.
    fn process_edit_events(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                EditEvent::Finished(result) => self.session.complete(&result),
                EditEvent::WorkerFailed(message) => {
                    self.session.complete(&Err(AppError::ui(message)));
                }
            }
            self.textures_dirty = true;
        }
    }

    fn refresh_textures(&mut self, ctx: &egui::Context) {
        if !self.textures_dirty {
            return;
        }
        self.original_texture = load_texture(ctx, "original", self.session.original_preview());
        self.edited_texture = load_texture(ctx, "edited", self.session.edited_preview());
        self.textures_dirty = false;
    }

    /// Renders the input column (image path, prompt, submit).
    fn render_input_ui(&mut self, ui: &mut egui::Ui) {
        ui.label("1. Upload Your Image");
        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut self.path_input)
                    .desired_width(ui.available_width() - 60.0)
                    .hint_text("Path to a PNG, JPG or WEBP file"),
            );
            let load_enabled = !self.session.is_in_flight() && !self.path_input.trim().is_empty();
            if ui.add_enabled(load_enabled, egui::Button::new("Load")).clicked() {
                let path = self.path_input.trim().to_string();
                self.load_path(Path::new(&path));
            }
        });
        ui.label(
            egui::RichText::new("PNG, JPG, WEBP up to 4MB, or drop a file onto the window")
                .small()
                .color(egui::Color32::GRAY),
        );

        ui.add_space(12.0);
        ui.label("2. Describe Your Edit");
        let response = ui.add(
            egui::TextEdit::multiline(&mut self.prompt_input)
                .desired_rows(4)
                .desired_width(f32::INFINITY)
                .hint_text("e.g., Add a retro filter, make it look like a watercolor painting..."),
        );
        if response.changed() && self.session.set_prompt(self.prompt_input.clone()).is_err() {
            // Locked while submitting
            self.prompt_input = self.session.prompt().to_string();
        }

        ui.add_space(12.0);
        let label = if self.session.is_in_flight() {
            "Generating..."
        } else {
            "Generate Image"
        };
        let button = egui::Button::new(label).min_size(egui::vec2(ui.available_width(), 32.0));
        if ui.add_enabled(self.session.can_submit(), button).clicked() {
            self.submit_request(ui.ctx());
        }
    }

    /// Renders the output column (original and edited previews).
    fn render_previews_ui(&mut self, ui: &mut egui::Ui) {
        draw_preview(
            ui,
            "Original Image",
            self.original_texture.as_ref(),
            "Your image will appear here",
            PREVIEW_HEIGHT,
        );

        ui.add_space(12.0);

        if self.session.is_in_flight() {
            egui::Frame::group(ui.style())
                .fill(egui::Color32::from_rgb(30, 30, 30))
                .inner_margin(10.0)
                .show(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.strong("Edited Image");
                        ui.add_space(PREVIEW_HEIGHT / 2.0 - 16.0);
                        ui.spinner();
                        ui.label("Editing your image...");
                        ui.add_space(PREVIEW_HEIGHT / 2.0 - 16.0);
                    });
                });
        } else {
            draw_preview(
                ui,
                "Edited Image",
                self.edited_texture.as_ref(),
                "Your edited image will appear here",
                PREVIEW_HEIGHT,
            );
        }
    }
}

/// Runs one edit on a fresh current-thread runtime.
fn run_pending(pending: PendingEdit, pipeline: &EditPipeline) -> EditEvent {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build();

    match runtime {
        Ok(rt) => EditEvent::Finished(rt.block_on(pending.run(pipeline))),
        Err(e) => EditEvent::WorkerFailed(format!("Failed to create async runtime: {}", e)),
    }
}

impl eframe::App for ImageEditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Enforce dark mode
        ctx.set_visuals(egui::Visuals::dark());

        self.process_edit_events();

        let dropped = ctx.input(|i| i.raw.dropped_files.first().cloned());
        if let Some(file) = dropped {
            if !self.session.is_in_flight() {
                self.load_dropped(&file);
            }
        }

        self.refresh_textures(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading("Gemini Image Editor");
                    ui.label("Describe your edits in plain English and let AI do the magic.");
                });
                ui.add_space(12.0);

                if let Some(message) = self.session.error() {
                    draw_error_banner(ui, message);
                    ui.add_space(12.0);
                }

                ui.columns(2, |columns| {
                    self.render_input_ui(&mut columns[0]);
                    self.render_previews_ui(&mut columns[1]);
                });
            });
        });
    }
}

/// Opens the editor window and blocks until it is closed.
///
/// # Arguments
/// * `config` - Application configuration
pub fn run(config: Config) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Gemini Image Editor")
            .with_inner_size([1100.0, 860.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    let pipeline = EditPipeline::new(Arc::new(GeminiClient::new(&config)));

    eframe::run_native(
        "Gemini Image Editor",
        options,
        Box::new(move |_cc| Ok(Box::new(ImageEditorApp::new(pipeline)) as Box<dyn eframe::App>)),
    )
    .map_err(|e| AppError::ui(format!("Failed to run UI: {}", e)))
}
