//! Fixed-timestep loop implementing the "Fix Your Timestep" pattern.
//!
//! Decouples simulation (fixed rate, 60 Hz by default) from rendering using
//! an accumulator. The simulated state is passed to both callbacks, mutably
//! to updates and shared to rendering. Both callbacks are fallible; the first
//! error stops the tick and is returned.

use std::time::Instant;
use tracing::warn;

/// Default simulation timestep: 60 Hz.
pub const FIXED_DT: f64 = 1.0 / 60.0;

/// Maximum frame time clamp to prevent spiral of death.
/// Longer frames are clamped and the simulation accepts slowdown.
pub const MAX_FRAME_TIME: f64 = 0.25;

/// Accumulator state shared by the wall-clock loop and explicit-time ticks.
#[derive(Debug, Clone)]
struct Accumulator {
    dt: f64,
    accumulator: f64,
    total_sim_time: f64,
    frame_count: u64,
    update_count: u64,
}

impl Accumulator {
    fn new(dt: f64) -> Self {
        Self {
            dt,
            accumulator: 0.0,
            total_sim_time: 0.0,
            frame_count: 0,
            update_count: 0,
        }
    }

    fn advance<S, E>(
        &mut self,
        frame_time: f64,
        state: &mut S,
        mut update_fn: impl FnMut(&mut S, f64, f64) -> Result<(), E>,
        mut render_fn: impl FnMut(&S, f64) -> Result<(), E>,
    ) -> Result<(), E> {
        self.accumulator += frame_time.min(MAX_FRAME_TIME);

        while self.accumulator >= self.dt {
            update_fn(state, self.dt, self.total_sim_time)?;
            self.total_sim_time += self.dt;
            self.accumulator -= self.dt;
            self.update_count += 1;
        }

        render_fn(state, self.alpha())?;
        self.frame_count += 1;
        Ok(())
    }

    fn alpha(&self) -> f64 {
        if self.accumulator > 0.0 {
            self.accumulator / self.dt
        } else {
            0.0
        }
    }
}

/// Wall-clock fixed-timestep loop.
///
/// Call [`tick`](Self::tick) once per frame.
pub struct GameLoop {
    previous_time: Instant,
    state: Accumulator,
}

impl GameLoop {
    /// Loop at the default 60 Hz step, starting from now.
    pub fn new() -> Self {
        Self::with_timestep(FIXED_DT)
    }

    /// Loop with a custom step in seconds. Non-positive steps fall back to
    /// [`FIXED_DT`].
    pub fn with_timestep(dt: f64) -> Self {
        let dt = if dt > 0.0 { dt } else { FIXED_DT };
        Self {
            previous_time: Instant::now(),
            state: Accumulator::new(dt),
        }
    }

    /// Runs one frame: measures elapsed time, runs fixed-rate simulation steps,
    /// then renders once.
    ///
    /// - `update_fn(state, dt, total_sim_time)` is called zero or more times.
    /// - `render_fn(state, alpha)` is called once with alpha in `[0.0, 1.0)`.
    pub fn tick<S, E>(
        &mut self,
        state: &mut S,
        update_fn: impl FnMut(&mut S, f64, f64) -> Result<(), E>,
        render_fn: impl FnMut(&S, f64) -> Result<(), E>,
    ) -> Result<(), E> {
        let current_time = Instant::now();
        let frame_time = current_time
            .duration_since(self.previous_time)
            .as_secs_f64();
        self.previous_time = current_time;

        if frame_time > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                frame_time * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
        }
        self.state.advance(frame_time, state, update_fn, render_fn)
    }

    /// Runs one frame that advances simulated time by exactly `frame_time`
    /// seconds, independent of the wall clock. Frame-limited runs use this so
    /// every frame performs its updates however fast it renders.
    pub fn tick_fixed<S, E>(
        &mut self,
        frame_time: f64,
        state: &mut S,
        update_fn: impl FnMut(&mut S, f64, f64) -> Result<(), E>,
        render_fn: impl FnMut(&S, f64) -> Result<(), E>,
    ) -> Result<(), E> {
        self.previous_time = Instant::now();
        self.state.advance(frame_time, state, update_fn, render_fn)
    }

    pub fn timestep(&self) -> f64 {
        self.state.dt
    }

    pub fn alpha(&self) -> f64 {
        self.state.alpha()
    }

    pub fn frame_count(&self) -> u64 {
        self.state.frame_count
    }

    pub fn update_count(&self) -> u64 {
        self.state.update_count
    }

}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new()
    }
}
