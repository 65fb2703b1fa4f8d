//! Frame composition and painting.
//!
//! [`compose`] is a pure function of the session and the viewport size; the
//! painter only turns its output into egui shapes. Nothing is kept between
//! frames except the filtered preview texture, which the app caches.

use eframe::egui;
use image::RgbaImage;

use crate::geometry::{self, DisplayPlacement, DisplayRect};
use crate::session::{PreprocessingSettings, Session};

pub const PLACEHOLDER_TITLE: &str = "Click or Drag & Drop Image Here";
pub const PLACEHOLDER_HINT: &str = "(Max recommended: 2000x2000px for performance)";

// ── Display filter ──────────────────────────────────────────────────────────

/// Colour operations applied to the preview, in this order: brightness,
/// contrast, saturate, grayscale. Each step clamps to `[0, 1]`; the steps do
/// not commute.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterChain {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub grayscale: f32,
}

impl From<&PreprocessingSettings> for FilterChain {
    fn from(s: &PreprocessingSettings) -> Self {
        Self {
            brightness: s.brightness as f32,
            contrast: s.contrast as f32,
            saturation: s.saturation as f32,
            grayscale: s.grayscale as f32,
        }
    }
}

fn mul3(m: [[f32; 3]; 3], c: [f32; 3]) -> [f32; 3] {
    let row = |r: [f32; 3]| (r[0] * c[0] + r[1] * c[1] + r[2] * c[2]).clamp(0.0, 1.0);
    [row(m[0]), row(m[1]), row(m[2])]
}

impl FilterChain {
    pub fn is_identity(&self) -> bool {
        self.brightness == 1.0 && self.contrast == 1.0 && self.saturation == 1.0 && self.grayscale == 0.0
    }

    /// One pixel, channels in `[0, 1]`.
    pub fn apply_rgb(&self, rgb: [f32; 3]) -> [f32; 3] {
        let b = self.brightness;
        let mut c = rgb.map(|v| (v * b).clamp(0.0, 1.0));

        let k = self.contrast;
        c = c.map(|v| (v * k + 0.5 - 0.5 * k).clamp(0.0, 1.0));

        let s = self.saturation;
        c = mul3(
            [
                [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
                [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
                [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
            ],
            c,
        );

        let g = 1.0 - self.grayscale.clamp(0.0, 1.0);
        mul3(
            [
                [0.2126 + 0.7874 * g, 0.7152 - 0.7152 * g, 0.0722 - 0.0722 * g],
                [0.2126 - 0.2126 * g, 0.7152 + 0.2848 * g, 0.0722 - 0.0722 * g],
                [0.2126 - 0.2126 * g, 0.7152 - 0.7152 * g, 0.0722 + 0.9278 * g],
            ],
            c,
        )
    }

    /// Filtered copy for display. The source buffer is left untouched.
    pub fn apply(&self, src: &RgbaImage) -> RgbaImage {
        let mut out = src.clone();
        if self.is_identity() {
            return out;
        }
        for px in out.pixels_mut() {
            let [r, g, b, a] = px.0;
            let rgb = self.apply_rgb([r, g, b].map(|v| v as f32 / 255.0));
            let [r, g, b] = rgb.map(|v| (v * 255.0).round() as u8);
            px.0 = [r, g, b, a];
        }
        out
    }
}

/// Filtered copy of `image`, ready to upload as the canvas texture.
pub fn preview_image(image: &RgbaImage, chain: &FilterChain) -> egui::ColorImage {
    let filtered = chain.apply(image);
    let size = [filtered.width() as usize, filtered.height() as usize];
    egui::ColorImage::from_rgba_unmultiplied(size, filtered.as_flat_samples().as_slice())
}

// ── Frame ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutlineKind {
    Normal,
    Selected,
    Candidate,
}

pub struct Style {
    pub stroke_width: f32,
    pub stroke: egui::Color32,
    pub label: egui::Color32,
}

pub fn style(kind: OutlineKind) -> Style {
    match kind {
        OutlineKind::Selected => Style {
            stroke_width: 2.5,
            stroke: egui::Color32::from_rgba_unmultiplied(220, 53, 69, 230),
            label: egui::Color32::from_rgb(220, 53, 69),
        },
        OutlineKind::Normal => Style {
            stroke_width: 1.5,
            stroke: egui::Color32::from_rgba_unmultiplied(25, 135, 84, 204),
            label: egui::Color32::from_rgb(25, 135, 84),
        },
        OutlineKind::Candidate => Style {
            stroke_width: 1.5,
            stroke: egui::Color32::from_rgba_unmultiplied(220, 53, 69, 179),
            label: egui::Color32::TRANSPARENT,
        },
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Outline {
    pub rect: DisplayRect,
    pub label: String,
    pub kind: OutlineKind,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub placement: DisplayPlacement,
    pub filter: FilterChain,
    /// Region outlines in list order, so later ones paint on top.
    pub outlines: Vec<Outline>,
    pub candidate: Option<DisplayRect>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Placeholder,
    Scene(Scene),
}

pub fn compose(session: &Session, viewport: (f64, f64)) -> Frame {
    let Some(image) = &session.image else {
        return Frame::Placeholder;
    };
    let placement =
        geometry::compute_display_placement(image.width(), image.height(), viewport.0, viewport.1);
    let selected = session.store.selected();
    let outlines = session
        .store
        .regions()
        .iter()
        .enumerate()
        .map(|(i, r)| Outline {
            rect: geometry::to_display_space(&r.coordinates, &placement),
            label: r.id.clone(),
            kind: if selected == Some(i) {
                OutlineKind::Selected
            } else {
                OutlineKind::Normal
            },
        })
        .collect();

    Frame::Scene(Scene {
        placement,
        filter: (&session.settings).into(),
        outlines,
        candidate: session.drag.candidate(),
    })
}

// ── Painting ────────────────────────────────────────────────────────────────

fn to_screen(origin: egui::Pos2, r: &DisplayRect) -> egui::Rect {
    egui::Rect::from_min_size(
        origin + egui::vec2(r.x as f32, r.y as f32),
        egui::vec2(r.w as f32, r.h as f32),
    )
}

/// Paint a composed frame into `canvas`. `texture` is the filtered preview.
pub fn paint(
    painter: &egui::Painter,
    canvas: egui::Rect,
    frame: &Frame,
    texture: Option<&egui::TextureHandle>,
) {
    match frame {
        Frame::Placeholder => {
            painter.rect_filled(canvas, 0.0, egui::Color32::from_rgb(0xf8, 0xf9, 0xfa));
            let ink = egui::Color32::from_rgb(0x6c, 0x75, 0x7d);
            let center = canvas.center();
            painter.text(
                center,
                egui::Align2::CENTER_CENTER,
                PLACEHOLDER_TITLE,
                egui::FontId::proportional(16.0),
                ink,
            );
            painter.text(
                center + egui::vec2(0.0, 25.0),
                egui::Align2::CENTER_CENTER,
                PLACEHOLDER_HINT,
                egui::FontId::proportional(12.0),
                ink,
            );
        }
        Frame::Scene(scene) => {
            painter.rect_filled(canvas, 0.0, egui::Color32::from_gray(40));
            let origin = canvas.min;
            if let Some(tex) = texture {
                painter.image(
                    tex.id(),
                    to_screen(origin, &scene.placement.image_bounds()),
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }

            for outline in &scene.outlines {
                let s = style(outline.kind);
                let rect = to_screen(origin, &outline.rect);
                painter.rect_stroke(
                    rect,
                    0.0,
                    egui::Stroke::new(s.stroke_width, s.stroke),
                    egui::StrokeKind::Middle,
                );
                painter.text(
                    rect.min + egui::vec2(4.0, 12.0),
                    egui::Align2::LEFT_BOTTOM,
                    &outline.label,
                    egui::FontId::proportional(11.0),
                    s.label,
                );
            }

            if let Some(candidate) = &scene.candidate {
                let s = style(OutlineKind::Candidate);
                painter.rect_stroke(
                    to_screen(origin, candidate),
                    0.0,
                    egui::Stroke::new(s.stroke_width, s.stroke),
                    egui::StrokeKind::Middle,
                );
            }
        }
    }
}
