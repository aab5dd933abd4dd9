//! The step host: owns an engine and calls registered listeners after every
//! step.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::{SimulationError, SimulationResult, TrafficEngine};

/// Error type a listener may return.  Boxed so that every listener crate can
/// keep its own error enum.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Callback invoked once per step, after the engine has advanced.
///
/// # Example — arrival counter
///
/// ```rust,ignore
/// struct Arrivals(usize);
///
/// impl StepListener for Arrivals {
///     fn on_step(&mut self, engine: &dyn TrafficEngine) -> Result<(), ListenerError> {
///         self.0 += engine.last_step_arrived_ids().len();
///         Ok(())
///     }
/// }
/// ```
pub trait StepListener {
    fn on_step(&mut self, engine: &dyn TrafficEngine) -> Result<(), ListenerError>;
}

/// A listener shared between the host and its owner, who keeps a handle to
/// read results back.
pub type SharedListener = Rc<RefCell<dyn StepListener>>;

/// Drives a [`TrafficEngine`] step by step.
///
/// Listeners run synchronously, in registration order, on the stepping
/// thread.  A failing listener does not stop the others: all of them see the
/// step, then the first error is returned.
pub struct Simulation<E: TrafficEngine> {
    engine:    E,
    listeners: Vec<SharedListener>,
    steps:     u64,
}

impl<E: TrafficEngine> Simulation<E> {
    pub fn new(engine: E) -> Self {
        Self { engine, listeners: Vec::new(), steps: 0 }
    }

    /// Register `listener` to run after every subsequent step.
    pub fn on_step(&mut self, listener: SharedListener) {
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Direct engine access, e.g. for phase commands between steps.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Steps taken since construction or the last [`reset`](Self::reset).
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Advance one step and notify every listener.
    pub fn step(&mut self) -> SimulationResult<()> {
        self.engine.advance()?;
        self.steps += 1;

        let mut first_err: Option<SimulationError> = None;
        for (i, listener) in self.listeners.iter().enumerate() {
            let outcome = match listener.try_borrow_mut() {
                Ok(mut l) => l.on_step(&self.engine).map_err(SimulationError::Listener),
                Err(_)    => Err(SimulationError::ListenerBusy(i)),
            };
            if let Err(e) = outcome {
                warn!(step = self.steps, listener = i, error = %e, "step listener failed");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None    => Ok(()),
        }
    }

    /// Run exactly `n` steps, stopping at the first error.
    pub fn step_n(&mut self, n: u64) -> SimulationResult<()> {
        for _ in 0..n {
            self.step()?;
        }
        Ok(())
    }

    /// Reset the engine.  Listeners stay registered.
    pub fn reset(&mut self) -> SimulationResult<()> {
        self.engine.reset()?;
        debug!(after_steps = self.steps, "simulation reset");
        self.steps = 0;
        Ok(())
    }
}
