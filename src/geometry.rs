//! Bidirectional mapping between image space and display space.
//!
//! Image space is the native pixel grid of the loaded image. Display space is
//! the canvas the image is letterboxed into: a uniform scale plus an offset on
//! the axis that has slack.

use crate::regions::Coordinates;

/// A rectangle in display space. Width and height may be negative while a
/// drag is in progress; call [`DisplayRect::normalized`] before mapping.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DisplayRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl DisplayRect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Axis-aligned box spanned by two corner points, in any drag direction.
    pub fn from_points(a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            x: a.0,
            y: a.1,
            w: b.0 - a.0,
            h: b.1 - a.1,
        }
        .normalized()
    }

    /// Same box with non-negative width and height.
    pub fn normalized(&self) -> Self {
        Self {
            x: self.x.min(self.x + self.w),
            y: self.y.min(self.y + self.h),
            w: self.w.abs(),
            h: self.h.abs(),
        }
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, p: (f64, f64)) -> bool {
        p.0 >= self.x && p.0 <= self.x + self.w && p.1 >= self.y && p.1 <= self.y + self.h
    }
}

/// Where the image lands inside the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayPlacement {
    pub offset_x: f64,
    pub offset_y: f64,
    pub display_width: f64,
    pub display_height: f64,
    pub scale: f64,
}

impl DisplayPlacement {
    /// Displayed bounding box of the whole image.
    pub fn image_bounds(&self) -> DisplayRect {
        DisplayRect::new(
            self.offset_x,
            self.offset_y,
            self.display_width,
            self.display_height,
        )
    }
}

/// Fit the image into the viewport without distortion and center it on the
/// axis with slack.
pub fn compute_display_placement(
    image_width: u32,
    image_height: u32,
    viewport_width: f64,
    viewport_height: f64,
) -> DisplayPlacement {
    let (iw, ih) = (image_width.max(1) as f64, image_height.max(1) as f64);
    let scale = (viewport_width / iw).min(viewport_height / ih);
    let display_width = iw * scale;
    let display_height = ih * scale;

    // Float error can leave a tiny negative offset on the constrained axis.
    DisplayPlacement {
        offset_x: ((viewport_width - display_width) / 2.0).max(0.0),
        offset_y: ((viewport_height - display_height) / 2.0).max(0.0),
        display_width,
        display_height,
        scale,
    }
}

/// Display rectangle to integer image pixels. Width and height are not
/// clamped against the image here.
pub fn to_image_space(rect: &DisplayRect, placement: &DisplayPlacement) -> Coordinates {
    let s = placement.scale;
    Coordinates {
        left: ((rect.x - placement.offset_x) / s).round().max(0.0) as u32,
        top: ((rect.y - placement.offset_y) / s).round().max(0.0) as u32,
        width: (rect.w / s).round().max(0.0) as u32,
        height: (rect.h / s).round().max(0.0) as u32,
    }
}

/// Exact inverse of the placement transform, used for drawing only.
pub fn to_display_space(coords: &Coordinates, placement: &DisplayPlacement) -> DisplayRect {
    let s = placement.scale;
    DisplayRect {
        x: coords.left as f64 * s + placement.offset_x,
        y: coords.top as f64 * s + placement.offset_y,
        w: coords.width as f64 * s,
        h: coords.height as f64 * s,
    }
}

/// Intersect a (normalized) display rectangle with the displayed image.
pub fn clip_to_image_bounds(
    rect: &DisplayRect,
    placement: &DisplayPlacement,
) -> Option<DisplayRect> {
    let bounds = placement.image_bounds();
    let x = rect.x.max(bounds.x);
    let y = rect.y.max(bounds.y);
    let end_x = (rect.x + rect.w).min(bounds.x + bounds.w);
    let end_y = (rect.y + rect.h).min(bounds.y + bounds.h);
    let (w, h) = (end_x - x, end_y - y);
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    Some(DisplayRect { x, y, w, h })
}
