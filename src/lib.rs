//! Animated proximity-network background.
//!
//! A field of slowly drifting nodes joined by distance-faded edges. Neighbour lookups go
//! through a uniform spatial grid rebuilt every frame, a density governor keeps the
//! population evenly spread, and a small lifecycle layer pauses, resizes and tears the
//! loop down on behalf of the host.

pub mod config;
pub mod governor;
pub mod grid;
pub mod lifecycle;
pub mod particles;
pub mod render;
pub mod simulation;
pub mod snapshot;
pub mod surface;

pub use config::{FieldConfig, Palette};
pub use governor::{rebalance, Interval, Rebalance};
pub use grid::{brute_force_pairs, SpatialGrid};
pub use lifecycle::{Debounce, FieldEvent, LoopState, NodeField};
pub use particles::{target_count, Particle, ParticleStore};
pub use render::{ellipse_fade, FrameStats, Renderer, Surface};
pub use simulation::Pointer;
pub use surface::{PainterSurface, RasterSurface};
