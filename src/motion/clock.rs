//! Fixed-timestep accumulator

use super::{MAX_STEPS_PER_FRAME, STEP_SECONDS};

/// Turns variable frame times into a whole number of fixed simulation steps
#[derive(Debug, Clone, Copy)]
pub struct FixedStepClock {
    step: f32,
    accumulator: f32,
    max_steps: u32,
}

impl FixedStepClock {
    pub fn new(step: f32, max_steps: u32) -> Self {
        Self {
            step,
            accumulator: 0.0,
            max_steps: max_steps.max(1),
        }
    }

    /// Feed elapsed frame time; returns how many steps to run now.
    /// Time beyond `max_steps` is discarded so a long stall cannot snowball.
    pub fn advance(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.max(0.0);

        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_steps {
            self.accumulator -= self.step;
            steps += 1;
        }
        if steps == self.max_steps {
            self.accumulator = self.accumulator.min(self.step - f32::EPSILON).max(0.0);
        }
        steps
    }

    /// How far the render time sits between the last two steps, in [0, 1)
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.step).clamp(0.0, 1.0 - f32::EPSILON)
    }

    pub fn step_seconds(&self) -> f32 {
        self.step
    }
}

impl Default for FixedStepClock {
    fn default() -> Self {
        Self::new(STEP_SECONDS, MAX_STEPS_PER_FRAME)
    }
}
