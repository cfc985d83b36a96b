//! Input state for the movement keys and the rotation joystick.
//!
//! Platform code updates this on key and pointer events; the motion step
//! reads it.

use glam::Vec2;

use super::JOYSTICK_RADIUS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionKey {
    Forward,
    Back,
    Left,
    Right,
}

impl DirectionKey {
    /// Map a WASD key code, case-insensitively
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'w' => Some(Self::Forward),
            's' => Some(Self::Back),
            'a' => Some(Self::Left),
            'd' => Some(Self::Right),
            _ => None,
        }
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyState {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl KeyState {
    pub fn set(&mut self, key: DirectionKey, held: bool) {
        match key {
            DirectionKey::Forward => self.forward = held,
            DirectionKey::Back => self.back = held,
            DirectionKey::Left => self.left = held,
            DirectionKey::Right => self.right = held,
        }
    }

    pub fn any_held(&self) -> bool {
        self.forward || self.back || self.left || self.right
    }

    /// Forward minus back, in {-1, 0, 1}
    pub fn forward_axis(&self) -> f32 {
        axis(self.forward, self.back)
    }

    /// Left minus right, in {-1, 0, 1}
    pub fn strafe_axis(&self) -> f32 {
        axis(self.left, self.right)
    }

    /// Where the on-screen movement knob sits, unit length or zero.
    /// Screen y grows downward, so forward is negative.
    pub fn knob(&self) -> Vec2 {
        Vec2::new(axis(self.right, self.left), axis(self.back, self.forward)).normalize_or_zero()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn axis(pos: bool, neg: bool) -> f32 {
    f32::from(u8::from(pos)) - f32::from(u8::from(neg))
}

/// Rotation joystick drag
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct PointerDrag {
    active: bool,
    offset: Vec2,
}

impl PointerDrag {
    pub fn begin(&mut self) {
        self.active = true;
    }

    /// Track the pointer while dragging. Returns the clamped offset, or
    /// `None` when no drag is in progress.
    pub fn update(&mut self, offset: Vec2) -> Option<Vec2> {
        if !self.active {
            return None;
        }
        self.offset = clamp_to_radius(offset, JOYSTICK_RADIUS);
        Some(self.offset)
    }

    /// Release the drag; the knob snaps back to the centre
    pub fn end(&mut self) {
        self.active = false;
        self.offset = Vec2::ZERO;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }
}

fn clamp_to_radius(v: Vec2, radius: f32) -> Vec2 {
    let len = v.length();
    if len > radius {
        v * (radius / len)
    } else {
        v
    }
}

/// Yaw for a joystick offset in screen space (y down). Straight up maps to
/// yaw 0, straight right to π/2.
pub fn yaw_from_offset(offset: Vec2) -> f32 {
    offset.y.atan2(offset.x) + std::f32::consts::FRAC_PI_2
}
