//! Preview rendering helpers.
//!
//! Turns [`DisplayResource`]s into egui textures and lays them out inside the
//! preview frames, keeping the aspect ratio.

use crate::codec::DisplayResource;
use crate::error::{AppError, Result};
use eframe::egui;

/// Decodes a display resource into pixels egui can upload.
///
/// # Errors
///
/// Returns [`AppError::Decode`] if the payload is not valid base64 or not a
/// decodable PNG/JPEG/WEBP image.
pub fn decode_preview(resource: &DisplayResource) -> Result<egui::ColorImage> {
    let bytes = resource.to_bytes()?;
    let image = image::load_from_memory(&bytes)
        .map_err(|e| AppError::Decode(format!("{} preview: {}", resource.mime_type(), e)))?;

    let buffer = image.to_rgba8();
    let size = [image.width() as usize, image.height() as usize];
    let pixels = buffer.as_flat_samples();
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice()))
}

/// Uploads a resource as a texture, logging and skipping undecodable ones.
pub fn load_texture(
    ctx: &egui::Context,
    name: &str,
    resource: Option<&DisplayResource>,
) -> Option<egui::TextureHandle> {
    let resource = resource?;
    match decode_preview(resource) {
        Ok(color_image) => Some(ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR)),
        Err(e) => {
            tracing::warn!(texture = name, "cannot render preview: {}", e);
            None
        }
    }
}

/// Scales `image` down to fit inside `available`, never up.
pub fn fit_size(image: egui::Vec2, available: egui::Vec2) -> egui::Vec2 {
    if image.x <= 0.0 || image.y <= 0.0 {
        return egui::Vec2::ZERO;
    }
    let scale = (available.x / image.x).min(available.y / image.y).min(1.0);
    image * scale.max(0.0)
}

/// Draws one titled preview frame: the texture, or a placeholder line.
pub fn draw_preview(
    ui: &mut egui::Ui,
    title: &str,
    texture: Option<&egui::TextureHandle>,
    placeholder: &str,
    max_height: f32,
) {
    egui::Frame::group(ui.style())
        .fill(egui::Color32::from_rgb(30, 30, 30))
        .inner_margin(10.0)
        .show(ui, |ui| {
            ui.vertical_centered(|ui| {
                ui.strong(title);
                ui.add_space(6.0);
                match texture {
                    Some(texture) => {
                        let available = egui::vec2(ui.available_width(), max_height);
                        let size = fit_size(texture.size_vec2(), available);
                        ui.image((texture.id(), size));
                    }
                    None => {
                        ui.add_space(max_height / 2.0 - 10.0);
                        ui.label(egui::RichText::new(placeholder).color(egui::Color32::GRAY));
                        ui.add_space(max_height / 2.0 - 10.0);
                    }
                }
            });
        });
}

/// Draws the error banner shown above the form.
pub fn draw_error_banner(ui: &mut egui::Ui, message: &str) {
    egui::Frame::group(ui.style())
        .fill(egui::Color32::from_rgb(80, 20, 20))
        .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(180, 60, 60)))
        .inner_margin(10.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(
                egui::RichText::new(format!("Error: {}", message))
                    .color(egui::Color32::from_rgb(255, 170, 170)),
            );
        });
}
