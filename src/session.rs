//! Everything one editing session owns.

use image::RgbaImage;

use crate::interaction::DragState;
use crate::regions::RegionStore;

/// Global display preprocessing. Also what the exported config describes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreprocessingSettings {
    pub brightness: f64,
    pub contrast: f64,
    pub saturation: f64,
    /// 0 or 1, fed straight into the grayscale filter amount.
    pub grayscale: u8,
    pub denoise: bool,
    pub sharpen: bool,
}

impl Default for PreprocessingSettings {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            contrast: 1.0,
            saturation: 1.0,
            grayscale: 0,
            denoise: false,
            sharpen: false,
        }
    }
}

impl PreprocessingSettings {
    /// Slider percentage (100 = unchanged) to a filter amount.
    pub fn from_percent(percent: u32) -> f64 {
        percent as f64 / 100.0
    }

    pub fn to_percent(amount: f64) -> u32 {
        (amount * 100.0).round().max(0.0) as u32
    }
}

/// A decoded image installed into the session.
pub struct LoadedImage {
    /// File stem, used to name the exported config.
    pub name: String,
    pub pixels: RgbaImage,
}

impl LoadedImage {
    pub fn new(name: impl Into<String>, pixels: RgbaImage) -> Self {
        Self {
            name: name.into(),
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Session state. The selection invariant lives in [`RegionStore`]; this type
/// only guarantees that a new image replaces store, drag and settings together.
#[derive(Default)]
pub struct Session {
    pub image: Option<LoadedImage>,
    pub store: RegionStore,
    pub drag: DragState,
    pub settings: PreprocessingSettings,
    /// An image decode is in flight; gestures are ignored until it lands.
    pub loading: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Install a freshly decoded image and reset everything derived from the
    /// previous one.
    pub fn install_image(&mut self, image: LoadedImage) {
        log::info!(
            "Installing image '{}' ({}x{})",
            image.name,
            image.width(),
            image.height()
        );
        self.store = RegionStore::new(image.width(), image.height());
        self.drag = DragState::Idle;
        self.settings = PreprocessingSettings::default();
        self.image = Some(image);
        self.loading = false;
    }

    /// A decode failed: end up imageless.
    pub fn drop_image(&mut self) {
        self.image = None;
        self.store = RegionStore::default();
        self.drag = DragState::Idle;
        self.loading = false;
    }

    /// Remove every region and abandon any in-progress draw.
    pub fn clear_regions(&mut self) {
        self.store.clear_all();
        self.drag = DragState::Idle;
    }

    pub fn reset_settings(&mut self) {
        self.settings = PreprocessingSettings::default();
    }
}
