//! Projection of the session into the downstream extraction config.

use serde::Serialize;

use crate::error::ExportError;
use crate::regions::{Coordinates, Region, RegionPreprocessing};
use crate::session::{PreprocessingSettings, Session};

/// Fixed unsharp-mask parameters emitted whenever sharpening is enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SharpenParams {
    pub sigma: u32,
    pub m1: u32,
    pub m2: u32,
    pub x1: u32,
    pub y2: u32,
    pub y3: u32,
}

pub const SHARPEN_PARAMS: SharpenParams = SharpenParams {
    sigma: 1,
    m1: 0,
    m2: 3,
    x1: 0,
    y2: 15,
    y3: 15,
};

/// Only settings that differ from the defaults are present.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GlobalPreprocessingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contrast: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grayscale: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denoise: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharpen: Option<SharpenParams>,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn changed(v: f64) -> Option<f64> {
    (v != 1.0).then(|| round2(v))
}

impl From<&PreprocessingSettings> for GlobalPreprocessingConfig {
    fn from(s: &PreprocessingSettings) -> Self {
        Self {
            brightness: changed(s.brightness),
            contrast: changed(s.contrast),
            saturation: changed(s.saturation),
            grayscale: (s.grayscale == 1).then_some(true),
            denoise: s.denoise.then_some(true),
            sharpen: s.sharpen.then_some(SHARPEN_PARAMS),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportedRegion {
    pub id: String,
    pub coordinates: Coordinates,
    pub preprocessing: RegionPreprocessing,
}

impl From<&Region> for ExportedRegion {
    fn from(r: &Region) -> Self {
        let c = r.coordinates;
        Self {
            id: r.id.clone(),
            coordinates: Coordinates {
                left: c.left,
                top: c.top,
                width: c.width.max(1),
                height: c.height.max(1),
            },
            preprocessing: RegionPreprocessing::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ConfigDocument {
    pub global_preprocessing_config: GlobalPreprocessingConfig,
    pub image_regions: Vec<ExportedRegion>,
    /// Always empty; filled in by the downstream tooling.
    pub field_extraction_rules: Vec<serde_json::Value>,
}

impl ConfigDocument {
    pub fn from_session(session: &Session) -> Result<Self, ExportError> {
        if !session.has_image() {
            return Err(ExportError::NoImage);
        }
        if session.store.is_empty() {
            return Err(ExportError::NoRegions);
        }
        Ok(Self {
            global_preprocessing_config: (&session.settings).into(),
            image_regions: session.store.regions().iter().map(Into::into).collect(),
            field_extraction_rules: Vec::new(),
        })
    }

    /// Render as an assignable JS module with a timestamp comment header.
    pub fn to_module(&self, generated_on: &str) -> Result<String, ExportError> {
        let json = serde_json::to_string_pretty(self)?;
        Ok(format!(
            "// Generated on: {generated_on}\nmodule.exports = {json};"
        ))
    }
}

/// `<image name>.config.js`
pub fn config_file_name(image_name: &str) -> String {
    format!("{image_name}.config.js")
}

/// Local time for the header, e.g. `2026-10-14 09:30:12`.
pub fn timestamp_now() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::LoadedImage;
    use image::RgbaImage;
    use serde_json::json;

    fn session_with_region() -> Session {
        let mut s = Session::new();
        s.install_image(LoadedImage::new("form", RgbaImage::new(1000, 500)));
        s.store.add_region(Coordinates {
            left: 125,
            top: 63,
            width: 250,
            height: 125,
        });
        s
    }

    fn to_value(doc: &ConfigDocument) -> serde_json::Value {
        serde_json::to_value(doc).unwrap()
    }

    #[test]
    fn test_export_requires_image() {
        let err = ConfigDocument::from_session(&Session::new()).unwrap_err();
        assert!(matches!(err, ExportError::NoImage));
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Please upload an image first.");
    }

    #[test]
    fn test_export_requires_regions() {
        let mut s = session_with_region();
        s.clear_regions();
        let err = ConfigDocument::from_session(&s).unwrap_err();
        assert!(matches!(err, ExportError::NoRegions));
    }

    #[test]
    fn test_default_settings_export_empty_global_config() {
        let doc = ConfigDocument::from_session(&session_with_region()).unwrap();
        assert_eq!(
            to_value(&doc),
            json!({
                "GLOBAL_PREPROCESSING_CONFIG": {},
                "IMAGE_REGIONS": [{
                    "id": "region_1",
                    "coordinates": {"left": 125, "top": 63, "width": 250, "height": 125},
                    "preprocessing": {}
                }],
                "FIELD_EXTRACTION_RULES": []
            })
        );
    }

    #[test]
    fn test_changed_settings_are_emitted() {
        let mut s = session_with_region();
        s.settings.brightness = PreprocessingSettings::from_percent(150);
        s.settings.contrast = 0.876;
        s.settings.grayscale = 1;
        s.settings.sharpen = true;
        let doc = ConfigDocument::from_session(&s).unwrap();
        assert_eq!(
            to_value(&doc)["GLOBAL_PREPROCESSING_CONFIG"],
            json!({
                "brightness": 1.5,
                "contrast": 0.88,
                "grayscale": true,
                "sharpen": {"sigma": 1, "m1": 0, "m2": 3, "x1": 0, "y2": 15, "y3": 15}
            })
        );
    }

    #[test]
    fn test_denoise_flag_only() {
        let mut s = session_with_region();
        s.settings.denoise = true;
        let cfg = GlobalPreprocessingConfig::from(&s.settings);
        assert_eq!(cfg.denoise, Some(true));
        assert_eq!(cfg.brightness, None);
        assert_eq!(cfg.sharpen, None);
    }

    #[test]
    fn test_module_wrapper() {
        let doc = ConfigDocument::from_session(&session_with_region()).unwrap();
        let text = doc.to_module("2026-10-14 09:30:12").unwrap();
        let (header, body) = text.split_once('\n').unwrap();
        assert_eq!(header, "// Generated on: 2026-10-14 09:30:12");
        let json = body
            .strip_prefix("module.exports = ")
            .and_then(|b| b.strip_suffix(';'))
            .unwrap();
        assert!(json.starts_with("{\n  \"GLOBAL_PREPROCESSING_CONFIG\""));
        let parsed: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, to_value(&doc));
    }

    #[test]
    fn test_config_file_name() {
        assert_eq!(config_file_name("invoice_07"), "invoice_07.config.js");
    }

    #[test]
    fn test_exported_region_floors_extents_at_one() {
        let region = Region {
            id: "stamp".to_string(),
            coordinates: Coordinates {
                left: 0,
                top: 0,
                width: 0,
                height: 0,
            },
            preprocessing: RegionPreprocessing::new(),
        };
        let exported = ExportedRegion::from(&region);
        assert_eq!(
            exported.coordinates,
            Coordinates {
                left: 0,
                top: 0,
                width: 1,
                height: 1,
            }
        );
        assert_eq!(exported.id, "stamp");
    }
}
