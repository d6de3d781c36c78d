//! Display viewport sizing
//!
//! Fits the intrinsic frame into the available view while preserving aspect
//! ratio. The non-constrained dimension grows past the view (fill and crop),
//! it is never letterboxed.

use serde::{Deserialize, Serialize};

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const ZERO: Self = Self::new(0, 0);

    /// Whether either dimension is zero
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Same size with width and height exchanged
    pub fn transposed(&self) -> Self {
        Self::new(self.height, self.width)
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Sensor orientation relative to the display, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RotationState {
    degrees: u32,
}

impl RotationState {
    /// Normalizes to 0, 90, 180 or 270
    pub fn from_degrees(degrees: i32) -> Self {
        let normalized = degrees.rem_euclid(360) as u32;
        Self {
            degrees: (normalized + 45) / 90 % 4 * 90,
        }
    }

    pub fn degrees(&self) -> u32 {
        self.degrees
    }

    /// True when the native frame is rotated a quarter turn
    pub fn is_rotated(&self) -> bool {
        self.degrees == 90 || self.degrees == 270
    }
}

/// Intrinsic frame size and orientation of an opened device.
///
/// Both halves are recorded together when the device is characterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub size: Size,
    pub rotation: RotationState,
}

impl FrameInfo {
    pub fn new(size: Size, rotation: RotationState) -> Self {
        Self { size, rotation }
    }

    pub fn compute_display_size(&self, view_size: Size) -> Option<Size> {
        compute_display_size(self.size, self.rotation.is_rotated(), view_size)
    }
}

/// Compute the on-screen rectangle for a frame inside a view.
///
/// Returns `None` when either size is empty (device not characterized or
/// view not measured yet).
pub fn compute_display_size(frame: Size, rotated: bool, view: Size) -> Option<Size> {
    if frame.is_empty() || view.is_empty() {
        return None;
    }

    let frame_aspect = if rotated {
        frame.height as f64 / frame.width as f64
    } else {
        frame.width as f64 / frame.height as f64
    };
    let view_aspect = view.aspect_ratio();

    if frame_aspect < view_aspect {
        let height = (view.width as f64 / frame_aspect).round() as u32;
        Some(Size::new(view.width, height))
    } else {
        let width = (view.height as f64 * frame_aspect).round() as u32;
        Some(Size::new(width, view.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landscape_frame_in_wider_aspect_view() {
        let size = compute_display_size(Size::new(1920, 1080), false, Size::new(800, 600));
        assert_eq!(size, Some(Size::new(1067, 600)));
    }

    #[test]
    fn test_rotated_frame_in_square_view() {
        let size = compute_display_size(Size::new(1080, 1920), true, Size::new(400, 400));
        assert_eq!(size, Some(Size::new(711, 400)));
    }

    #[test]
    fn test_wide_view_constrains_width() {
        // 4:3 frame into a 16:9 view: width fixed, height grows past the view
        let size = compute_display_size(Size::new(640, 480), false, Size::new(1280, 720));
        assert_eq!(size, Some(Size::new(1280, 960)));
    }

    #[test]
    fn test_unknown_sizes_are_absent() {
        assert_eq!(compute_display_size(Size::ZERO, false, Size::new(800, 600)), None);
        assert_eq!(compute_display_size(Size::new(640, 480), false, Size::ZERO), None);
        assert_eq!(compute_display_size(Size::new(640, 0), false, Size::new(10, 10)), None);
    }

    #[test]
    fn test_rotation_normalization() {
        assert!(RotationState::from_degrees(90).is_rotated());
        assert!(RotationState::from_degrees(-90).is_rotated());
        assert_eq!(RotationState::from_degrees(-90).degrees(), 270);
        assert!(!RotationState::from_degrees(180).is_rotated());
        assert_eq!(RotationState::from_degrees(360).degrees(), 0);
    }
}
