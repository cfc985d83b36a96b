//! Client-side motion: keys and joystick drag in, avatar pose out.
//!
//! [`MotionState`] is the single piece of state shared by input callbacks
//! and the frame loop. Input handlers call the `on_*` methods; the frame loop
//! calls [`MotionState::advance`] with the frame time and reads
//! [`MotionState::render_position`]. Simulation runs on a fixed step, so the
//! pose is interpolated between the last two steps for rendering.
//!
//! Every method that moves the avatar returns the new position, which the
//! caller sends to the relay as a `move` event. Rotation is never sent.

pub mod clock;
pub mod input;
pub mod jump;

pub use clock::FixedStepClock;
pub use input::{yaw_from_offset, DirectionKey, KeyState, PointerDrag};
pub use jump::JumpState;

use glam::{Vec2, Vec3};

/// Distance covered per movement update
pub const MOVE_SPEED: f32 = 0.2;
/// Rotation joystick radius in screen pixels
pub const JOYSTICK_RADIUS: f32 = 50.0;
/// Upward velocity at take-off, per step
pub const JUMP_STRENGTH: f32 = 0.25;
/// Vertical velocity lost per step
pub const GRAVITY: f32 = 0.012;
/// Share of the facing direction carried as jump momentum, per step
pub const JUMP_FORWARD_FACTOR: f32 = 0.1;
/// Ground height of the flat world
pub const RESTING_HEIGHT: f32 = 0.0;
/// Simulation step length
pub const STEP_SECONDS: f32 = 1.0 / 60.0;
/// Catch-up cap after a long frame
pub const MAX_STEPS_PER_FRAME: u32 = 5;

/// Unit facing vector for a yaw; yaw 0 faces +Z
pub fn forward(yaw: f32) -> Vec3 {
    Vec3::new(yaw.sin(), 0.0, yaw.cos())
}

/// Strafe axis for a yaw; the left key moves along it, the right key against it
pub fn right(yaw: f32) -> Vec3 {
    Vec3::new(yaw.cos(), 0.0, -yaw.sin())
}

/// Displacement for one movement update, or `None` when the held keys cancel out
pub fn displacement(yaw: f32, keys: &KeyState) -> Option<Vec3> {
    let raw = forward(yaw) * keys.forward_axis() + right(yaw) * keys.strafe_axis();
    if raw.length_squared() > 0.0 {
        Some(raw.normalize() * MOVE_SPEED)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct MotionState {
    position: Vec3,
    previous_position: Vec3,
    yaw: f32,
    keys: KeyState,
    drag: PointerDrag,
    jump: JumpState,
    /// Drives the leg-swing animation
    moving: bool,
    clock: FixedStepClock,
}

impl MotionState {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            previous_position: position,
            yaw: 0.0,
            keys: KeyState::default(),
            drag: PointerDrag::default(),
            jump: JumpState::default(),
            moving: false,
            clock: FixedStepClock::default(),
        }
    }

    pub fn with_clock(mut self, clock: FixedStepClock) -> Self {
        self.clock = clock;
        self
    }

    /// Key press or release. Movement is applied right away, as well as on
    /// every following step while keys stay held.
    pub fn on_key(&mut self, key: DirectionKey, held: bool) -> Option<Vec3> {
        self.keys.set(key, held);
        let moved = self.apply_movement();
        if let Some(pos) = moved {
            // No step produced this move, so there is nothing to interpolate from.
            self.previous_position = pos;
        }
        moved
    }

    /// Space bar. Returns false if already airborne.
    pub fn on_jump(&mut self) -> bool {
        self.jump.trigger(forward(self.yaw))
    }

    pub fn on_pointer_down(&mut self) {
        self.drag.begin();
    }

    /// Pointer moved to `offset` from the joystick centre (screen space, y down)
    pub fn on_pointer_move(&mut self, offset: Vec2) {
        if let Some(clamped) = self.drag.update(offset) {
            self.yaw = yaw_from_offset(clamped);
        }
    }

    pub fn on_pointer_up(&mut self) {
        self.drag.end();
    }

    /// Translate by the held keys. Sets the moving flag either way.
    pub fn apply_movement(&mut self) -> Option<Vec3> {
        match displacement(self.yaw, &self.keys) {
            Some(delta) => {
                self.position += delta;
                self.moving = true;
                Some(self.position)
            }
            None => {
                self.moving = false;
                None
            }
        }
    }

    /// One fixed simulation step: held-key movement, then the jump arc.
    pub fn step(&mut self) -> Option<Vec3> {
        self.previous_position = self.position;

        let walked = if self.keys.any_held() {
            self.apply_movement().is_some()
        } else {
            false
        };
        let jumped = self.jump.step(&mut self.position);

        (walked || jumped).then_some(self.position)
    }

    /// Feed a frame's elapsed time and run the steps it covers. Returns the
    /// latest position if any step moved the avatar.
    pub fn advance(&mut self, dt: f32) -> Option<Vec3> {
        let steps = self.clock.advance(dt);
        let mut moved = None;
        for _ in 0..steps {
            if let Some(pos) = self.step() {
                moved = Some(pos);
            }
        }
        moved
    }

    /// Pose to draw this frame, between the last two steps
    pub fn render_position(&self) -> Vec3 {
        self.previous_position
            .lerp(self.position, self.clock.alpha())
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        self.yaw = yaw;
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn is_jumping(&self) -> bool {
        self.jump.is_active()
    }

    pub fn keys(&self) -> &KeyState {
        &self.keys
    }

    pub fn drag(&self) -> &PointerDrag {
        &self.drag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn forward_at_yaw_zero_is_plus_z() {
        let mut m = MotionState::new(Vec3::ZERO);
        let pos = m.on_key(DirectionKey::Forward, true).unwrap();
        assert_eq!(pos, Vec3::new(0.0, 0.0, MOVE_SPEED));
        assert!(m.is_moving());
    }

    #[test]
    fn diagonal_is_normalized() {
        let keys = KeyState {
            forward: true,
            left: true,
            ..Default::default()
        };
        let d = displacement(0.0, &keys).unwrap();
        assert!((d.length() - MOVE_SPEED).abs() < 1e-6);
        assert!(d.x > 0.0 && d.z > 0.0);
    }

    #[test]
    fn cancelling_keys_stop_movement_and_emit_nothing() {
        let mut m = MotionState::new(Vec3::ZERO);
        m.on_key(DirectionKey::Forward, true);
        assert_eq!(m.on_key(DirectionKey::Back, true), None);
        assert!(!m.is_moving());
        assert_eq!(m.position(), Vec3::new(0.0, 0.0, MOVE_SPEED));
    }

    #[test]
    fn release_clears_moving() {
        let mut m = MotionState::new(Vec3::ZERO);
        m.on_key(DirectionKey::Left, true);
        assert_eq!(m.on_key(DirectionKey::Left, false), None);
        assert!(!m.is_moving());
    }

    #[test]
    fn movement_follows_yaw() {
        let mut m = MotionState::new(Vec3::ZERO);
        m.set_yaw(FRAC_PI_2);
        let pos = m.on_key(DirectionKey::Forward, true).unwrap();
        assert!(approx(pos, Vec3::new(MOVE_SPEED, 0.0, 0.0)));
    }

    #[test]
    fn rotation_only_while_dragging() {
        let mut m = MotionState::new(Vec3::ZERO);
        m.on_pointer_move(Vec2::new(JOYSTICK_RADIUS, 0.0));
        assert_eq!(m.yaw(), 0.0);

        m.on_pointer_down();
        m.on_pointer_move(Vec2::new(4.0 * JOYSTICK_RADIUS, 0.0));
        assert!((m.yaw() - FRAC_PI_2).abs() < 1e-6);

        m.on_pointer_up();
        m.on_pointer_move(Vec2::new(0.0, -JOYSTICK_RADIUS));
        assert!((m.yaw() - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn steps_repeat_held_movement() {
        let mut m = MotionState::new(Vec3::ZERO);
        m.on_key(DirectionKey::Forward, true);
        for _ in 0..4 {
            assert!(m.step().is_some());
        }
        assert!(approx(m.position(), Vec3::new(0.0, 0.0, 5.0 * MOVE_SPEED)));
    }

    #[test]
    fn idle_step_reports_nothing() {
        let mut m = MotionState::new(Vec3::new(1.0, 0.0, 2.0));
        assert_eq!(m.step(), None);
        assert_eq!(m.advance(1.0), None);
        assert_eq!(m.position(), Vec3::new(1.0, 0.0, 2.0));
    }

    #[test]
    fn jump_steps_report_position_until_landing() {
        let mut m = MotionState::new(Vec3::ZERO);
        assert!(m.on_jump());
        assert!(!m.on_jump());

        let mut reports = 0;
        while m.is_jumping() {
            assert!(m.step().is_some());
            reports += 1;
        }
        assert!(reports > 2);
        assert_eq!(m.position().y, RESTING_HEIGHT);
        assert!(m.position().z > 0.0);
        assert_eq!(m.step(), None);
    }

    #[test]
    fn advance_runs_fixed_steps_and_interpolates() {
        let mut m = MotionState::new(Vec3::ZERO).with_clock(FixedStepClock::new(0.01, 10));
        m.on_key(DirectionKey::Forward, true);
        let after_key = m.position();

        let pos = m.advance(0.025).unwrap();
        assert!(approx(pos, after_key + Vec3::Z * 2.0 * MOVE_SPEED));

        // Halfway between the last two steps.
        let drawn = m.render_position();
        assert!(approx(drawn, pos - Vec3::Z * 0.5 * MOVE_SPEED));
    }

    #[test]
    fn key_move_is_drawn_where_it_landed() {
        let mut m = MotionState::new(Vec3::ZERO).with_clock(FixedStepClock::new(0.01, 10));
        m.advance(0.005);
        let pos = m.on_key(DirectionKey::Forward, true).unwrap();
        assert_eq!(m.render_position(), pos);
    }

    #[test]
    fn frame_rate_does_not_change_distance() {
        // Binary fractions keep the accumulator exact.
        let clock = FixedStepClock::new(1.0 / 64.0, 100);
        let mut fast = MotionState::new(Vec3::ZERO).with_clock(clock);
        let mut slow = MotionState::new(Vec3::ZERO).with_clock(clock);
        fast.on_jump();
        slow.on_jump();

        for _ in 0..16 {
            fast.advance(1.0 / 256.0);
        }
        for _ in 0..2 {
            slow.advance(1.0 / 32.0);
        }
        assert!(fast.is_jumping());
        assert!(approx(fast.position(), slow.position()));
    }
}
