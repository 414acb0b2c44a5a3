// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Fixed-tick physics thread
//!
//! [`FixedTickDriver`] owns the dedicated physics thread. The thread is
//! started when the driver is created and joined when it is dropped; in
//! between it runs [`EntityManager::fixed_update`] once per tick period while
//! the simulation is running.
//!
//! # Lock ordering
//!
//! The driver has two locks of its own. When both are needed they are taken
//! in this order:
//!
//! 1. the tick lock, held for a whole tick and by `stop()` while resetting,
//! 2. the state lock, held only to read or change [`SimulationState`].
//!
//! Entity mutexes are only ever taken after the tick lock.

use crate::error::{EngineError, Result};
use crate::frame::{self, FrameOutcome, PlayerControls};
use crate::registry::EntityManager;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Run state of the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationState {
    /// Ticks are running
    Running,
    /// Ticks are suspended, entities keep their state
    Paused,
    /// Ticks are suspended and entities are back at spawn
    Stopped,
}

struct Shared {
    manager: Arc<EntityManager>,
    state: Mutex<SimulationState>,
    wake: Condvar,
    tick: Mutex<()>,
    shutdown: AtomicBool,
    ticks: AtomicU64,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, SimulationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tick_lock(&self) -> MutexGuard<'_, ()> {
        self.tick.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: SimulationState) -> SimulationState {
        let mut state = self.state();
        let previous = *state;
        *state = next;
        self.wake.notify_all();
        previous
    }
}

/// Owner of the physics thread and its play/pause/stop controls
///
/// # Example
///
/// ```
/// use platform_physics::driver::FixedTickDriver;
/// use platform_physics::registry::EntityManager;
/// use std::sync::Arc;
///
/// let manager = Arc::new(EntityManager::default());
/// let driver = FixedTickDriver::new(manager).unwrap();
/// driver.play();
/// assert!(driver.is_running());
/// driver.stop();
/// assert!(!driver.is_running());
/// ```
pub struct FixedTickDriver {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl FixedTickDriver {
    /// Start the physics thread in the stopped state
    ///
    /// Fails if the registry's configuration is invalid or the thread cannot
    /// be spawned.
    pub fn new(manager: Arc<EntityManager>) -> Result<Self> {
        manager.config().validate()?;
        let shared = Arc::new(Shared {
            manager,
            state: Mutex::new(SimulationState::Stopped),
            wake: Condvar::new(),
            tick: Mutex::new(()),
            shutdown: AtomicBool::new(false),
            ticks: AtomicU64::new(0),
        });

        let worker = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name("physics-tick".to_string())
            .spawn(move || run(&worker))
            .map_err(EngineError::ThreadSpawn)?;

        Ok(FixedTickDriver {
            shared,
            thread: Some(thread),
        })
    }

    /// The registry driven by this thread
    pub fn manager(&self) -> &Arc<EntityManager> {
        &self.shared.manager
    }

    /// Start or resume ticking
    pub fn play(&self) {
        let previous = self.shared.set_state(SimulationState::Running);
        if previous != SimulationState::Running {
            log::info!("Simulation playing");
        }
    }

    /// Suspend ticking without resetting entities
    pub fn pause(&self) {
        let previous = self.shared.set_state(SimulationState::Paused);
        if previous == SimulationState::Running {
            log::info!("Simulation paused");
        }
    }

    /// Suspend ticking and reset every entity to its spawn state
    ///
    /// Waits for a tick in progress to finish first.
    pub fn stop(&self) {
        let _tick = self.shared.tick_lock();
        self.shared.set_state(SimulationState::Stopped);
        self.shared.manager.reset_entities();
        log::info!("Simulation stopped");
    }

    /// Current run state
    pub fn state(&self) -> SimulationState {
        *self.shared.state()
    }

    /// Whether ticks are running
    pub fn is_running(&self) -> bool {
        self.state() == SimulationState::Running
    }

    /// Number of ticks run since the driver was created
    pub fn tick_count(&self) -> u64 {
        self.shared.ticks.load(Ordering::Acquire)
    }

    /// Per-frame update from the render thread
    ///
    /// Does nothing unless the simulation is running. A win stops the
    /// simulation.
    pub fn update_frame(&self, controls: PlayerControls, dt: f64) -> FrameOutcome {
        if !self.is_running() {
            return FrameOutcome::Idle;
        }
        let outcome = frame::update_frame(&self.shared.manager, controls, dt);
        if outcome == FrameOutcome::Won {
            self.stop();
        }
        outcome
    }
}

impl Drop for FixedTickDriver {
    fn drop(&mut self) {
        {
            let _state = self.shared.state();
            self.shared.shutdown.store(true, Ordering::Release);
            self.shared.wake.notify_all();
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::warn!("Physics thread panicked");
            }
        }
    }
}

fn run(shared: &Shared) {
    let period = shared.manager.config().tick_period();
    let dt = shared.manager.config().tick_seconds();
    log::debug!("Physics thread started with a {:?} tick", period);

    loop {
        {
            let mut state = shared.state();
            while *state != SimulationState::Running && !shared.shutdown.load(Ordering::Acquire) {
                state = shared.wake.wait(state).unwrap_or_else(PoisonError::into_inner);
            }
        }
        if shared.shutdown.load(Ordering::Acquire) {
            break;
        }

        let start = Instant::now();
        {
            let _tick = shared.tick_lock();
            if *shared.state() == SimulationState::Running {
                shared.manager.fixed_update(dt);
                shared.ticks.fetch_add(1, Ordering::AcqRel);
            }
        }

        let elapsed = start.elapsed();
        if elapsed >= period {
            log::warn!("Physics tick took {:?}, over the {:?} budget", elapsed, period);
            continue;
        }
        let state = shared.state();
        if !shared.shutdown.load(Ordering::Acquire) {
            // Woken early by play/pause/stop or shutdown; the loop re-checks both
            let _ = shared
                .wake
                .wait_timeout(state, period - elapsed)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
    log::debug!("Physics thread exiting");
}
