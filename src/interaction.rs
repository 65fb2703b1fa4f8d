//! Pointer gestures to region mutations.
//!
//! Single primary button: press, any number of moves, release. Selection is
//! held by the region store and can coexist with `Idle`.

use crate::geometry::{self, DisplayPlacement, DisplayRect};
use crate::regions::MIN_REGION_SIZE;
use crate::session::Session;

/// Display-space point relative to the canvas origin.
pub type Point = (f64, f64);

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Drawing { anchor: Point, current: Point },
}

impl DragState {
    /// Live candidate box while drawing.
    pub fn candidate(&self) -> Option<DisplayRect> {
        match *self {
            DragState::Drawing { anchor, current } => Some(DisplayRect::from_points(anchor, current)),
            DragState::Idle => None,
        }
    }
}

/// What a pointer event did, so the caller knows whether to sync the region list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gesture {
    Ignored,
    Selected(usize),
    Deselected,
    DrawStarted,
    DrawUpdated,
    Committed(usize),
    Discarded,
}

impl Session {
    fn accepts_gestures(&self) -> bool {
        self.has_image() && !self.loading
    }

    pub fn pointer_down(&mut self, point: Point, placement: &DisplayPlacement) -> Gesture {
        if !self.accepts_gestures() {
            return Gesture::Ignored;
        }

        if let Some(index) = self.store.find_region_at(point, placement) {
            self.store.select(Some(index));
            self.drag = DragState::Idle;
            log::debug!("Pointer down on region {index}");
            return Gesture::Selected(index);
        }

        let had_selection = self.store.selected().is_some();
        self.store.select(None);
        if placement.image_bounds().contains(point) {
            self.drag = DragState::Drawing {
                anchor: point,
                current: point,
            };
            log::debug!("Draw started at {point:?}");
            Gesture::DrawStarted
        } else {
            self.drag = DragState::Idle;
            if had_selection {
                Gesture::Deselected
            } else {
                Gesture::Ignored
            }
        }
    }

    pub fn pointer_move(&mut self, point: Point) -> Gesture {
        match &mut self.drag {
            DragState::Drawing { current, .. } if *current != point => {
                *current = point;
                Gesture::DrawUpdated
            }
            _ => Gesture::Ignored,
        }
    }

    /// Finish a draw. Boxes that clip to less than 5×5 display pixels are
    /// dropped without creating a region.
    pub fn pointer_up(&mut self, placement: &DisplayPlacement) -> Gesture {
        let Some(candidate) = self.drag.candidate() else {
            return Gesture::Ignored;
        };
        self.drag = DragState::Idle;
        if !self.has_image() {
            return Gesture::Ignored;
        }

        let min = MIN_REGION_SIZE as f64;
        let clipped = geometry::clip_to_image_bounds(&candidate, placement)
            .filter(|r| r.w >= min && r.h >= min);
        let Some(clipped) = clipped else {
            log::debug!("Discarded draw {candidate:?}");
            return Gesture::Discarded;
        };

        let coords = geometry::to_image_space(&clipped, placement);
        self.store.add_region(coords);
        Gesture::Committed(self.store.len() - 1)
    }
}
