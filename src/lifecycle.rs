//! Lifecycle of a mounted node field: the frame loop state machine, the debounced resize,
//! the density governor timer, pointer input and teardown.
//!
//! Everything runs on the host's single UI thread. The host calls [`NodeField::advance`]
//! with wall time to drive timers, and [`NodeField::frame`] whenever it has a frame to
//! paint; a frame only simulates and draws while the loop is running.

use crate::config::FieldConfig;
use crate::governor::{self, Interval, Rebalance};
use crate::grid::SpatialGrid;
use crate::particles::{target_count, ParticleStore};
use crate::render::{FrameStats, Renderer, Surface};
use crate::simulation::{self, Pointer};
use egui::{Pos2, Vec2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
    /// Terminal: resources released, every further event is ignored
    TornDown,
}

/// Signals the host forwards to a mounted field
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldEvent {
    Hidden,
    Visible,
    Resized(Vec2),
    PointerMoved(Pos2),
    PointerLeft,
}

/// Trailing-edge debounce: only the last value survives a burst, delivered once `delay`
/// has passed without a newer one.
#[derive(Clone, Copy, Debug)]
pub struct Debounce<T> {
    delay: Duration,
    pending: Option<(T, Duration)>,
}

impl<T: Copy> Debounce<T> {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn push(&mut self, value: T) {
        self.pending = Some((value, Duration::ZERO));
    }

    pub fn tick(&mut self, dt: Duration) -> Option<T> {
        let (value, waited) = self.pending.as_mut()?;
        *waited += dt;
        if *waited >= self.delay {
            let value = *value;
            self.pending = None;
            Some(value)
        } else {
            None
        }
    }

    pub fn pending(&self) -> Option<T> {
        self.pending.map(|(value, _)| value)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// A mounted, self-maintaining node field
pub struct NodeField {
    config: FieldConfig,
    store: ParticleStore,
    bounds: Vec2,
    pointer: Pointer,
    state: LoopState,
    /// A frame is owed to the host; cleared by pause and teardown
    frame_requested: bool,
    resize: Debounce<Vec2>,
    governor: Option<Interval>,
    rng: StdRng,
    frames: u64,
}

impl NodeField {
    /// Mount on a drawing surface of `surface_size`. Without a surface nothing is set up
    /// and the host keeps a static page.
    pub fn mount(surface_size: Option<Vec2>, config: FieldConfig) -> Option<Self> {
        let Some(size) = surface_size else {
            log::debug!("no drawing surface, node field not mounted");
            return None;
        };
        Some(Self::new(size, config))
    }

    /// Mount on a surface of known size and start the frame loop
    pub fn new(size: Vec2, config: FieldConfig) -> Self {
        let config = config.sanitized();
        let bounds = size.max(Vec2::ZERO);
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let count = target_count(bounds.x, bounds.y, &config.density);
        let store = ParticleStore::initialize(count, bounds, &config, &mut rng);
        log::info!(
            "node field mounted at {}x{} with {} nodes",
            bounds.x,
            bounds.y,
            count
        );

        Self {
            resize: Debounce::new(config.resize_debounce()),
            governor: Some(Interval::new(config.density_interval())),
            config,
            store,
            bounds,
            pointer: Pointer::default(),
            state: LoopState::Running,
            frame_requested: true,
            rng,
            frames: 0,
        }
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// The host should schedule another frame
    pub fn wants_frame(&self) -> bool {
        self.frame_requested
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames
    }

    pub fn pointer(&self) -> Option<Pos2> {
        self.pointer.position()
    }

    pub fn pending_resize(&self) -> Option<Vec2> {
        self.resize.pending()
    }

    pub fn governor_armed(&self) -> bool {
        self.governor.is_some()
    }

    pub fn handle(&mut self, event: FieldEvent) {
        if self.state == LoopState::TornDown {
            log::trace!("ignoring {:?} after teardown", event);
            return;
        }
        match event {
            FieldEvent::Hidden => self.pause(),
            FieldEvent::Visible => self.resume(),
            FieldEvent::Resized(size) => self.resize.push(size.max(Vec2::ZERO)),
            FieldEvent::PointerMoved(pos) => self.pointer.moved(pos),
            FieldEvent::PointerLeft => self.pointer.left(),
        }
    }

    fn pause(&mut self) {
        if self.state == LoopState::Running {
            self.state = LoopState::Stopped;
            self.frame_requested = false;
            log::debug!("frame loop paused");
        }
    }

    fn resume(&mut self) {
        if self.state == LoopState::Stopped {
            self.state = LoopState::Running;
            self.frame_requested = true;
            log::debug!("frame loop resumed");
        }
    }

    /// Feed wall time to the resize debounce and the governor timer
    pub fn advance(&mut self, dt: Duration) {
        if self.state == LoopState::TornDown {
            return;
        }
        if let Some(size) = self.resize.tick(dt) {
            self.apply_resize(size);
        }
        let due = self.governor.as_mut().map_or(false, |timer| timer.tick(dt));
        if due {
            self.rebalance();
        }
    }

    /// Adopt a new viewport size and grow or shrink the population to match
    pub fn apply_resize(&mut self, size: Vec2) {
        self.bounds = size;
        let target = target_count(size.x, size.y, &self.config.density);
        let before = self.store.len();
        self.store.resize_to(target, size, &self.config, &mut self.rng);
        log::debug!(
            "resized to {}x{}: {} -> {} nodes",
            size.x,
            size.y,
            before,
            self.store.len()
        );
    }

    /// One density governor pass, independent of the frame loop
    pub fn rebalance(&mut self) -> Rebalance {
        governor::rebalance(&mut self.store, self.bounds, &self.config, &mut self.rng)
    }

    /// Simulate one tick, rebuild the grid and draw. Does nothing unless running.
    pub fn frame<S: Surface + ?Sized>(&mut self, surface: &mut S) -> Option<FrameStats> {
        if self.state != LoopState::Running {
            return None;
        }
        simulation::step(
            self.store.particles_mut(),
            self.bounds,
            self.pointer.position(),
            &self.config.motion,
            &mut self.rng,
        );
        let stats = self.draw(surface);
        self.frames += 1;
        self.frame_requested = true;
        Some(stats)
    }

    /// Draw the current state without advancing it
    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S) -> FrameStats {
        let grid = SpatialGrid::build(
            self.store.particles(),
            self.bounds,
            self.config.density.cell_size,
        );
        Renderer::new(&self.config).draw(surface, self.store.particles(), &grid, self.bounds)
    }

    /// Release everything: pending frame, debounce timer, governor timer, pointer input
    pub fn teardown(&mut self) {
        if self.state == LoopState::TornDown {
            return;
        }
        self.state = LoopState::TornDown;
        self.frame_requested = false;
        self.resize.cancel();
        self.governor = None;
        self.pointer.left();
        log::info!("node field torn down after {} frames", self.frames);
    }
}

impl Drop for NodeField {
    fn drop(&mut self) {
        self.teardown();
    }
}
