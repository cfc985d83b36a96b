//! Ballistic jump with forward momentum

use glam::Vec3;

use super::{GRAVITY, JUMP_FORWARD_FACTOR, JUMP_STRENGTH, RESTING_HEIGHT};

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct JumpState {
    active: bool,
    vertical_velocity: f32,
    horizontal_velocity: Vec3,
}

impl JumpState {
    /// Start a jump carrying `forward` momentum. Ignored mid-air.
    pub fn trigger(&mut self, forward: Vec3) -> bool {
        if self.active {
            return false;
        }
        self.horizontal_velocity = forward * JUMP_FORWARD_FACTOR;
        self.vertical_velocity = JUMP_STRENGTH;
        self.active = true;
        true
    }

    /// Advance one step. Returns true if `position` changed.
    pub fn step(&mut self, position: &mut Vec3) -> bool {
        if !self.active {
            return false;
        }

        position.y += self.vertical_velocity;
        position.x += self.horizontal_velocity.x;
        position.z += self.horizontal_velocity.z;
        self.vertical_velocity -= GRAVITY;

        if position.y <= RESTING_HEIGHT {
            position.y = RESTING_HEIGHT;
            self.land();
        }
        true
    }

    fn land(&mut self) {
        self.active = false;
        self.vertical_velocity = 0.0;
        self.horizontal_velocity = Vec3::ZERO;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }

    pub fn horizontal_velocity(&self) -> Vec3 {
        self.horizontal_velocity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_landing(jump: &mut JumpState, pos: &mut Vec3) -> Vec<f32> {
        let mut heights = Vec::new();
        for _ in 0..10_000 {
            if !jump.step(pos) {
                break;
            }
            heights.push(pos.y);
        }
        heights
    }

    #[test]
    fn arc_rises_then_falls_then_lands_exactly() {
        let mut jump = JumpState::default();
        let mut pos = Vec3::new(0.0, RESTING_HEIGHT, 0.0);
        assert!(jump.trigger(Vec3::Z));

        let heights = run_to_landing(&mut jump, &mut pos);
        let peak = heights
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();

        assert!(peak > 0 && peak < heights.len() - 1);
        assert!(heights[..=peak].windows(2).all(|w| w[1] > w[0]));
        assert!(heights[peak..].windows(2).all(|w| w[1] < w[0]));
        assert!(heights[0] > RESTING_HEIGHT);
        assert_eq!(*heights.last().unwrap(), RESTING_HEIGHT);

        assert!(!jump.is_active());
        assert_eq!(jump.vertical_velocity(), 0.0);
        assert_eq!(jump.horizontal_velocity(), Vec3::ZERO);
    }

    #[test]
    fn momentum_carries_along_forward() {
        let mut jump = JumpState::default();
        let mut pos = Vec3::ZERO;
        jump.trigger(Vec3::Z);
        let steps = run_to_landing(&mut jump, &mut pos).len() as f32;

        assert_eq!(pos.x, 0.0);
        assert!((pos.z - steps * JUMP_FORWARD_FACTOR).abs() < 1e-3);
    }

    #[test]
    fn retrigger_mid_air_is_ignored() {
        let mut jump = JumpState::default();
        let mut pos = Vec3::ZERO;
        assert!(jump.trigger(Vec3::X));
        jump.step(&mut pos);
        let v = jump.vertical_velocity();

        assert!(!jump.trigger(Vec3::Z));
        assert_eq!(jump.vertical_velocity(), v);
        assert_eq!(jump.horizontal_velocity(), Vec3::X * JUMP_FORWARD_FACTOR);
    }

    #[test]
    fn idle_jump_does_not_move() {
        let mut jump = JumpState::default();
        let mut pos = Vec3::new(1.0, 0.0, 1.0);
        assert!(!jump.step(&mut pos));
        assert_eq!(pos, Vec3::new(1.0, 0.0, 1.0));
    }
}
