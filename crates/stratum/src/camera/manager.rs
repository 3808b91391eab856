//! # Camera Manager — Split Screen and Picture-in-Picture
//!
//! Up to [`MAX_CAMERAS`] cameras share one screen. Each slot has a camera, an
//! active bit and a [`LayerMask`] saying which layers it renders. A
//! [`SplitScreenLayout`] assigns screen viewports to the slots it uses:
//!
//! ```text
//!   Single          VerticalSplit     HorizontalSplit    Quadrant
//!  ┌─────────┐      ┌────┬────┐       ┌─────────┐       ┌────┬────┐
//!  │         │      │    │    │       │    0    │       │ 0  │ 1  │
//!  │    0    │      │ 0  │ 1  │       ├─────────┤       ├────┼────┤
//!  │         │      │    │    │       │    1    │       │ 2  │ 3  │
//!  └─────────┘      └────┴────┘       └─────────┘       └────┴────┘
//! ```
//!
//! `Custom` leaves viewports to the caller
//! ([`CameraManager::set_custom_viewport`]). Viewports are whole pixels and
//! tile the screen exactly; on odd sizes the right/bottom half gets the extra
//! pixel.

use super::{Camera, CameraError};
use crate::layer::LayerMask;
use crate::math::{Rect, Vec2};

/// Number of camera slots.
pub const MAX_CAMERAS: usize = 4;

/// How the screen is divided among cameras.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitScreenLayout {
    #[default]
    Single,
    /// Left / right halves.
    VerticalSplit,
    /// Top / bottom halves.
    HorizontalSplit,
    /// Four quarters: top-left, top-right, bottom-left, bottom-right.
    Quadrant,
    /// Viewports set explicitly; resizing leaves them alone.
    Custom,
}

impl SplitScreenLayout {
    /// Slots the layout activates. `Custom` activates none by itself.
    pub fn active_mask(self) -> u8 {
        match self {
            SplitScreenLayout::Single => 0b0001,
            SplitScreenLayout::VerticalSplit | SplitScreenLayout::HorizontalSplit => 0b0011,
            SplitScreenLayout::Quadrant => 0b1111,
            SplitScreenLayout::Custom => 0,
        }
    }
}

/// Owns the camera slots and their screen layout.
#[derive(Debug, Clone)]
pub struct CameraManager {
    cameras: [Camera; MAX_CAMERAS],
    active: u8,
    layout: SplitScreenLayout,
    layer_masks: [LayerMask; MAX_CAMERAS],
    screen_size: Vec2,
}

impl CameraManager {
    /// One active full-screen camera; the other slots idle.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            cameras: std::array::from_fn(|_| Camera::new(width, height)),
            active: SplitScreenLayout::Single.active_mask(),
            layout: SplitScreenLayout::Single,
            layer_masks: [LayerMask::ALL; MAX_CAMERAS],
            screen_size: Vec2::new(width, height),
        }
    }

    pub fn camera(&self, index: usize) -> Result<&Camera, CameraError> {
        self.cameras.get(index).ok_or(CameraError::IndexOutOfRange(index))
    }

    pub fn camera_mut(&mut self, index: usize) -> Result<&mut Camera, CameraError> {
        self.cameras.get_mut(index).ok_or(CameraError::IndexOutOfRange(index))
    }

    pub fn layout(&self) -> SplitScreenLayout {
        self.layout
    }

    pub fn screen_size(&self) -> Vec2 {
        self.screen_size
    }

    /// Switch layout: activates exactly the slots the layout uses and assigns
    /// their viewports. `Custom` keeps the current active set and viewports.
    pub fn setup_split_screen(&mut self, layout: SplitScreenLayout) {
        self.layout = layout;
        if layout != SplitScreenLayout::Custom {
            self.active = layout.active_mask();
        }
        self.recalculate_viewports();
        log::debug!("Split screen: {layout:?}, active mask {:#06b}", self.active);
    }

    /// Set the active slots directly. Bit `i` is slot `i`.
    pub fn set_active_mask(&mut self, mask: u8) -> Result<(), CameraError> {
        let out_of_range = mask >> MAX_CAMERAS;
        if out_of_range != 0 {
            let index = MAX_CAMERAS + out_of_range.trailing_zeros() as usize;
            return Err(CameraError::IndexOutOfRange(index));
        }
        self.active = mask;
        Ok(())
    }

    pub fn active_mask(&self) -> u8 {
        self.active
    }

    pub fn set_active(&mut self, index: usize, active: bool) -> Result<(), CameraError> {
        if index >= MAX_CAMERAS {
            return Err(CameraError::IndexOutOfRange(index));
        }
        if active {
            self.active |= 1 << index;
        } else {
            self.active &= !(1 << index);
        }
        Ok(())
    }

    pub fn is_active(&self, index: usize) -> bool {
        index < MAX_CAMERAS && self.active & (1 << index) != 0
    }

    pub fn active_count(&self) -> usize {
        self.active.count_ones() as usize
    }

    /// Resize every camera and re-lay out the viewports. World positions are
    /// left alone (apart from bounds clamping).
    pub fn set_screen_size(&mut self, width: f32, height: f32) {
        self.screen_size = Vec2::new(width, height);
        for camera in &mut self.cameras {
            camera.set_screen_size(width, height);
        }
        self.recalculate_viewports();
    }

    /// Recompute viewports for the current layout and screen size.
    pub fn recalculate_viewports(&mut self) {
        let (w, h) = (self.screen_size.x, self.screen_size.y);
        let left = (w * 0.5).floor();
        let top = (h * 0.5).floor();
        let viewports = match self.layout {
            SplitScreenLayout::Single => {
                self.cameras[0].set_screen_viewport(None);
                return;
            }
            SplitScreenLayout::Custom => return,
            SplitScreenLayout::VerticalSplit => vec![
                Rect::new(0.0, 0.0, left, h),
                Rect::new(left, 0.0, w - left, h),
            ],
            SplitScreenLayout::HorizontalSplit => vec![
                Rect::new(0.0, 0.0, w, top),
                Rect::new(0.0, top, w, h - top),
            ],
            SplitScreenLayout::Quadrant => vec![
                Rect::new(0.0, 0.0, left, top),
                Rect::new(left, 0.0, w - left, top),
                Rect::new(0.0, top, left, h - top),
                Rect::new(left, top, w - left, h - top),
            ],
        };
        for (camera, viewport) in self.cameras.iter_mut().zip(viewports) {
            camera.set_screen_viewport(Some(viewport));
        }
    }

    /// Give one slot an explicit viewport and switch to the `Custom` layout.
    pub fn set_custom_viewport(&mut self, index: usize, viewport: Rect) -> Result<(), CameraError> {
        self.camera_mut(index)?.set_screen_viewport(Some(viewport));
        self.layout = SplitScreenLayout::Custom;
        Ok(())
    }

    /// Layers slot `index` renders (intersected with global visibility at draw time).
    pub fn set_layer_mask(&mut self, index: usize, mask: LayerMask) -> Result<(), CameraError> {
        let slot = self
            .layer_masks
            .get_mut(index)
            .ok_or(CameraError::IndexOutOfRange(index))?;
        *slot = mask;
        Ok(())
    }

    pub fn layer_mask(&self, index: usize) -> Result<LayerMask, CameraError> {
        self.layer_masks
            .get(index)
            .copied()
            .ok_or(CameraError::IndexOutOfRange(index))
    }

    /// Active cameras in slot order, with their slot index.
    ///
    /// Each call returns a fresh iterator.
    pub fn active_cameras(&self) -> impl Iterator<Item = (usize, &Camera)> + '_ {
        let active = self.active;
        self.cameras
            .iter()
            .enumerate()
            .filter(move |&(i, _)| active & (1 << i) != 0)
    }
}

impl Default for CameraManager {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}
