//! Region data model and the store that owns it.

use serde::Serialize;

use crate::geometry::{self, DisplayPlacement};

/// Smallest width/height accepted from a draw gesture or a coordinate edit.
pub const MIN_REGION_SIZE: u32 = 5;

// ── Data Model ──────────────────────────────────────────────────────────────

/// Integer image-space rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Coordinates {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Coordinates {
    pub fn get(&self, field: CoordinateField) -> u32 {
        match field {
            CoordinateField::Left => self.left,
            CoordinateField::Top => self.top,
            CoordinateField::Width => self.width,
            CoordinateField::Height => self.height,
        }
    }

    fn set(&mut self, field: CoordinateField, value: u32) {
        match field {
            CoordinateField::Left => self.left = value,
            CoordinateField::Top => self.top = value,
            CoordinateField::Width => self.width = value,
            CoordinateField::Height => self.height = value,
        }
    }

    /// Pin the rectangle inside a `width`×`height` image, keeping it at least 1×1.
    fn fit_within(&self, image_width: u32, image_height: u32) -> Self {
        let width = self.width.clamp(1, image_width.max(1));
        let height = self.height.clamp(1, image_height.max(1));
        Self {
            left: self.left.min(image_width.saturating_sub(width)),
            top: self.top.min(image_height.saturating_sub(height)),
            width,
            height,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordinateField {
    Left,
    Top,
    Width,
    Height,
}

impl CoordinateField {
    pub const ALL: [CoordinateField; 4] = [
        CoordinateField::Left,
        CoordinateField::Top,
        CoordinateField::Width,
        CoordinateField::Height,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CoordinateField::Left => "Left:",
            CoordinateField::Top => "Top:",
            CoordinateField::Width => "Width:",
            CoordinateField::Height => "Height:",
        }
    }

    /// The field sharing this field's image axis.
    fn partner(self) -> CoordinateField {
        match self {
            CoordinateField::Left => CoordinateField::Width,
            CoordinateField::Width => CoordinateField::Left,
            CoordinateField::Top => CoordinateField::Height,
            CoordinateField::Height => CoordinateField::Top,
        }
    }

    fn is_extent(self) -> bool {
        matches!(self, CoordinateField::Width | CoordinateField::Height)
    }
}

/// Per-region preprocessing slot. Nothing writes to it yet; it exports as `{}`.
pub type RegionPreprocessing = serde_json::Map<String, serde_json::Value>;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Region {
    pub id: String,
    pub coordinates: Coordinates,
    pub preprocessing: RegionPreprocessing,
}

/// Result of a coordinate edit: the value actually stored, plus the partner
/// field if it had to move to keep the rectangle inside the image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoordinateUpdate {
    pub applied: u32,
    pub cascaded: Option<(CoordinateField, u32)>,
}

// ── Store ───────────────────────────────────────────────────────────────────

/// Ordered regions of one image, in image-space pixels, plus the selection.
///
/// `selected` is always `None` or a valid index; every removal goes through
/// this type so the two cannot drift apart.
#[derive(Clone, Debug, Default)]
pub struct RegionStore {
    regions: Vec<Region>,
    selected: Option<usize>,
    image_size: (u32, u32),
}

impl RegionStore {
    pub fn new(image_width: u32, image_height: u32) -> Self {
        Self {
            regions: Vec::new(),
            selected: None,
            image_size: (image_width, image_height),
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn image_size(&self) -> (u32, u32) {
        self.image_size
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_region(&self) -> Option<&Region> {
        self.selected.and_then(|i| self.regions.get(i))
    }

    /// Out-of-range indices clear the selection.
    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index.filter(|&i| i < self.regions.len());
    }

    /// Append a region with the next default id and select it.
    ///
    /// The id is derived from the current count, so after deletions it can
    /// repeat one already in the list.
    pub fn add_region(&mut self, coords: Coordinates) -> &Region {
        let (w, h) = self.image_size;
        let region = Region {
            id: format!("region_{}", self.regions.len() + 1),
            coordinates: coords.fit_within(w, h),
            preprocessing: RegionPreprocessing::new(),
        };
        log::info!("Added {} at {:?}", region.id, region.coordinates);
        self.regions.push(region);
        let index = self.regions.len() - 1;
        self.selected = Some(index);
        &self.regions[index]
    }

    /// Set one coordinate with dependent clamping against the image bounds.
    ///
    /// `left`/`top` range over `[0, image − extent]`; `width`/`height` over
    /// `[5, image − origin]`. When the minimum extent no longer fits beside
    /// the origin, the origin is pulled back and reported in `cascaded`.
    /// Returns `None` for an unknown index.
    pub fn update_coordinate(
        &mut self,
        index: usize,
        field: CoordinateField,
        raw_value: i64,
    ) -> Option<CoordinateUpdate> {
        let (w, h) = self.image_size;
        let region = self.regions.get_mut(index)?;
        let coords = &mut region.coordinates;
        let axis_size = match field {
            CoordinateField::Left | CoordinateField::Width => w,
            CoordinateField::Top | CoordinateField::Height => h,
        } as i64;
        let partner = field.partner();
        let partner_value = coords.get(partner) as i64;

        let mut cascaded = None;
        let value = if field.is_extent() {
            let min = (MIN_REGION_SIZE as i64).min(axis_size).max(1);
            let value = raw_value.min(axis_size - partner_value).max(min);
            if partner_value + value > axis_size {
                let origin = (axis_size - value) as u32;
                coords.set(partner, origin);
                cascaded = Some((partner, origin));
            }
            value
        } else {
            raw_value.min(axis_size - partner_value).max(0)
        };
        let applied = value as u32;
        coords.set(field, applied);

        log::debug!(
            "{} {:?} <- {} (requested {}, cascade {:?})",
            region.id,
            field,
            applied,
            raw_value,
            cascaded
        );
        Some(CoordinateUpdate { applied, cascaded })
    }

    /// Current allowed range for `field` of region `index`, for slider bounds.
    pub fn coordinate_range(&self, index: usize, field: CoordinateField) -> Option<(u32, u32)> {
        let (w, h) = self.image_size;
        let coords = self.regions.get(index)?.coordinates;
        let axis_size = match field {
            CoordinateField::Left | CoordinateField::Width => w,
            CoordinateField::Top | CoordinateField::Height => h,
        };
        let max = axis_size.saturating_sub(coords.get(field.partner()));
        let min = if field.is_extent() {
            MIN_REGION_SIZE.min(max)
        } else {
            0
        };
        Some((min, max))
    }

    pub fn delete_region(&mut self, index: usize) -> Option<Region> {
        if index >= self.regions.len() {
            return None;
        }
        let removed = self.regions.remove(index);
        self.selected = match self.selected {
            Some(s) if s == index => None,
            Some(s) if s > index => Some(s - 1),
            other => other,
        };
        log::info!("Deleted {}", removed.id);
        Some(removed)
    }

    /// Callers confirm with the operator before invoking this.
    pub fn clear_all(&mut self) {
        self.regions.clear();
        self.selected = None;
    }

    /// Ids are stored verbatim; duplicates are allowed.
    pub fn rename_region(&mut self, index: usize, new_id: impl Into<String>) -> bool {
        match self.regions.get_mut(index) {
            Some(region) => {
                region.id = new_id.into();
                true
            }
            None => false,
        }
    }

    /// Topmost (last drawn) region under a display-space point.
    pub fn find_region_at(&self, point: (f64, f64), placement: &DisplayPlacement) -> Option<usize> {
        self.regions
            .iter()
            .enumerate()
            .rev()
            .find(|(_, r)| geometry::to_display_space(&r.coordinates, placement).contains(point))
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::compute_display_placement;

    fn coords(left: u32, top: u32, width: u32, height: u32) -> Coordinates {
        Coordinates {
            left,
            top,
            width,
            height,
        }
    }

    fn store_with(n: usize) -> RegionStore {
        let mut store = RegionStore::new(1000, 500);
        for i in 0..n {
            store.add_region(coords(i as u32 * 100, 10, 50, 50));
        }
        store
    }

    fn assert_in_bounds(store: &RegionStore) {
        let (w, h) = store.image_size();
        for r in store.regions() {
            let c = r.coordinates;
            assert!(c.left + c.width <= w, "{c:?}");
            assert!(c.top + c.height <= h, "{c:?}");
            assert!(c.width >= 1 && c.height >= 1, "{c:?}");
        }
    }

    #[test]
    fn test_add_assigns_sequential_ids_and_selects() {
        let mut store = RegionStore::new(1000, 500);
        assert_eq!(store.add_region(coords(0, 0, 10, 10)).id, "region_1");
        assert_eq!(store.add_region(coords(5, 5, 10, 10)).id, "region_2");
        assert_eq!(store.selected(), Some(1));
        assert!(store.regions()[0].preprocessing.is_empty());
    }

    #[test]
    fn test_default_ids_can_repeat_after_delete() {
        let mut store = store_with(3);
        store.delete_region(0);
        assert_eq!(store.add_region(coords(0, 0, 10, 10)).id, "region_3");
        let ids: Vec<_> = store.regions().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["region_2", "region_3", "region_3"]);
    }

    #[test]
    fn test_clear_all_restarts_numbering() {
        let mut store = store_with(4);
        store.clear_all();
        assert!(store.is_empty());
        assert_eq!(store.selected(), None);
        assert_eq!(store.add_region(coords(0, 0, 10, 10)).id, "region_1");
    }

    #[test]
    fn test_add_fits_oversized_rect_into_image() {
        let mut store = RegionStore::new(100, 80);
        let r = store.add_region(coords(90, 70, 30, 30)).coordinates;
        assert_eq!(r, coords(70, 50, 30, 30));
    }

    #[test]
    fn test_left_limited_by_width() {
        let mut store = RegionStore::new(1000, 500);
        store.add_region(coords(100, 100, 300, 100));
        let u = store.update_coordinate(0, CoordinateField::Left, 900).unwrap();
        assert_eq!(u.applied, 700);
        assert_eq!(u.cascaded, None);
        let u = store.update_coordinate(0, CoordinateField::Left, -20).unwrap();
        assert_eq!(u.applied, 0);
    }

    #[test]
    fn test_width_limited_by_left_and_minimum() {
        let mut store = RegionStore::new(1000, 500);
        store.add_region(coords(600, 100, 100, 100));
        let u = store.update_coordinate(0, CoordinateField::Width, 800).unwrap();
        assert_eq!(u.applied, 400);
        let u = store.update_coordinate(0, CoordinateField::Width, 2).unwrap();
        assert_eq!(u.applied, MIN_REGION_SIZE);
        assert_eq!(store.regions()[0].coordinates.left, 600);
    }

    #[test]
    fn test_minimum_height_pulls_top_back() {
        let mut store = RegionStore::new(1000, 500);
        store.add_region(coords(0, 0, 50, 50));
        // Direct construction can leave an extent below the edit minimum.
        store.regions[0].coordinates = coords(0, 498, 50, 2);
        let u = store.update_coordinate(0, CoordinateField::Height, 1).unwrap();
        assert_eq!(u.applied, 5);
        assert_eq!(u.cascaded, Some((CoordinateField::Top, 495)));
        assert_eq!(store.regions()[0].coordinates, coords(0, 495, 50, 5));
    }

    #[test]
    fn test_minimum_width_pulls_left_back() {
        let mut store = RegionStore::new(1000, 500);
        store.add_region(coords(0, 0, 50, 50));
        store.regions[0].coordinates = coords(997, 10, 3, 40);
        let u = store.update_coordinate(0, CoordinateField::Width, 2).unwrap();
        assert_eq!(u.applied, 5);
        assert_eq!(u.cascaded, Some((CoordinateField::Left, 995)));
        assert_eq!(store.regions()[0].coordinates, coords(995, 10, 5, 40));
    }

    #[test]
    fn test_edits_never_leave_image_bounds() {
        let mut store = RegionStore::new(640, 480);
        store.add_region(coords(10, 10, 100, 100));
        let raws = [-50_i64, 0, 1, 4, 5, 17, 239, 480, 479, 640, 700, 10_000];
        for field in CoordinateField::ALL {
            for (step, raw) in raws.iter().enumerate() {
                let other = CoordinateField::ALL[step % 4];
                store.update_coordinate(0, field, *raw);
                store.update_coordinate(0, other, raw / 2);
                assert_in_bounds(&store);
            }
        }
    }

    #[test]
    fn test_update_unknown_index_is_none() {
        let mut store = store_with(1);
        assert!(store.update_coordinate(3, CoordinateField::Top, 1).is_none());
    }

    #[test]
    fn test_coordinate_range_follows_partner() {
        let mut store = RegionStore::new(1000, 500);
        store.add_region(coords(200, 100, 300, 50));
        assert_eq!(store.coordinate_range(0, CoordinateField::Left), Some((0, 700)));
        assert_eq!(store.coordinate_range(0, CoordinateField::Width), Some((5, 800)));
        assert_eq!(store.coordinate_range(0, CoordinateField::Top), Some((0, 450)));
        assert_eq!(store.coordinate_range(0, CoordinateField::Height), Some((5, 400)));
    }

    #[test]
    fn test_delete_selected_clears_selection() {
        let mut store = store_with(3);
        store.select(Some(1));
        store.delete_region(1);
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn test_delete_before_selection_shifts_it() {
        let mut store = store_with(3);
        store.select(Some(2));
        store.delete_region(0);
        assert_eq!(store.selected(), Some(1));
        assert_eq!(store.selected_region().unwrap().id, "region_3");
    }

    #[test]
    fn test_delete_after_selection_keeps_it() {
        let mut store = store_with(3);
        store.select(Some(0));
        store.delete_region(2);
        assert_eq!(store.selected(), Some(0));
        assert!(store.delete_region(7).is_none());
    }

    #[test]
    fn test_rename_is_verbatim() {
        let mut store = store_with(2);
        assert!(store.rename_region(1, "region_1"));
        assert_eq!(store.regions()[0].id, store.regions()[1].id);
        assert!(!store.rename_region(5, "x"));
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let placement = compute_display_placement(1000, 500, 800.0, 800.0);
        let mut store = RegionStore::new(1000, 500);
        store.add_region(coords(0, 0, 500, 250));
        store.add_region(coords(100, 50, 100, 100));
        // Inside both: display (120, 280) -> image (150, 100).
        assert_eq!(store.find_region_at((120.0, 280.0), &placement), Some(1));
        // Only the first.
        assert_eq!(store.find_region_at((350.0, 350.0), &placement), Some(0));
        // Letterbox band above the image.
        assert_eq!(store.find_region_at((120.0, 100.0), &placement), None);
    }

    #[test]
    fn test_select_rejects_out_of_range() {
        let mut store = store_with(2);
        store.select(Some(5));
        assert_eq!(store.selected(), None);
    }
}
