//! Configuration for the node field
//! Every tunable of the animation lives here; a `FieldConfig` is built once at mount
//! and passed by reference to each component.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use anyhow::Context;

// ============================================================================
// Palette
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Palette {
    pub background: [u8; 3],
    pub accent: [u8; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self::blue()
    }
}

impl Palette {
    pub fn blue() -> Self {
        Self {
            background: [249, 250, 251],
            accent: [37, 99, 235],
        }
    }

    pub fn gray() -> Self {
        Self {
            background: [249, 250, 251],
            accent: [156, 163, 175],
        }
    }
}

// ============================================================================
// Motion
// ============================================================================

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct MotionConfig {
    pub base_speed: f32,    // Initial speed along the random heading
    pub turn_rate: f32,     // Heading random-walk amplitude per tick
    pub steer_accel: f32,   // Velocity nudge along the heading per tick
    pub damping: f32,       // Velocity multiplier per tick
    pub repulsion_radius: f32,
    pub repulsion_strength: f32,
    pub birth_fade_speed: f32, // Fade-in increment per tick
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            base_speed: 0.05,
            turn_rate: 0.01,
            steer_accel: 0.01,
            damping: 0.95,
            repulsion_radius: 150.0,
            repulsion_strength: 0.2,
            birth_fade_speed: 0.002,
        }
    }
}

// ============================================================================
// Connections
// ============================================================================

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct ConnectionConfig {
    pub max_distance: f32,
    pub min_width: f32,   // Edge width at full centre de-emphasis
    pub width_range: f32, // Added width at ellipse fade 1.0
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_distance: 150.0,
            min_width: 0.8,
            width_range: 1.7,
        }
    }
}

// ============================================================================
// Nodes
// ============================================================================

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct NodeStyle {
    pub min_radius: f32,
    pub radius_range: f32,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            min_radius: 2.0,
            radius_range: 1.5,
        }
    }
}

// ============================================================================
// Centre ellipse fade
// ============================================================================

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct EllipseFade {
    pub radius_x: f32,
    pub radius_y: f32,
    pub strength: f32, // 0 = no de-emphasis, 1 = fully transparent at the centre
    pub exponent: f32,
    pub floor: f32,    // Lowest fade factor ever returned
}

impl Default for EllipseFade {
    fn default() -> Self {
        Self {
            radius_x: 700.0,
            radius_y: 600.0,
            strength: 0.7,
            exponent: 2.5,
            floor: 0.02,
        }
    }
}

// ============================================================================
// Population & density
// ============================================================================

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct DensityConfig {
    pub cell_size: f32,
    pub min_per_cell: usize,
    pub max_per_cell: usize,
    pub min_nodes: usize,
    pub max_nodes: usize,
    pub reference_width: f32,
    pub reference_height: f32,
    pub interval_ms: u64, // Governor period
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            cell_size: 200.0,
            min_per_cell: 2,
            max_per_cell: 8,
            min_nodes: 40,
            max_nodes: 180,
            reference_width: 1920.0,
            reference_height: 1080.0,
            interval_ms: 3000,
        }
    }
}

// ============================================================================
// Main field configuration
// ============================================================================

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct FieldConfig {
    pub motion: MotionConfig,
    pub connections: ConnectionConfig,
    pub nodes: NodeStyle,
    pub ellipse: EllipseFade,
    pub density: DensityConfig,
    pub palette: Palette,
    pub resize_debounce_ms: u64,
    /// Fixed RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            motion: MotionConfig::default(),
            connections: ConnectionConfig::default(),
            nodes: NodeStyle::default(),
            ellipse: EllipseFade::default(),
            density: DensityConfig::default(),
            palette: Palette::default(),
            resize_debounce_ms: 100,
            seed: None,
        }
    }
}

impl FieldConfig {
    pub fn density_interval(&self) -> Duration {
        Duration::from_millis(self.density.interval_ms)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("writing field config to {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading field config from {}", path.display()))?;
        let config: FieldConfig = serde_json::from_str(&json)
            .with_context(|| format!("parsing field config {}", path.display()))?;
        Ok(config.sanitized())
    }

    /// Get all available preset names
    pub fn preset_names() -> Vec<&'static str> {
        vec!["Landing", "Classic"]
    }

    /// Build a preset by name, `None` for an unknown name
    pub fn preset(name: &str) -> Option<Self> {
        let mut config = Self::default();
        if config.apply_preset(name) {
            Some(config)
        } else {
            None
        }
    }

    /// Apply a preset by name. Returns false and leaves `self` untouched for unknown names.
    pub fn apply_preset(&mut self, name: &str) -> bool {
        match name {
            "Landing" => self.preset_landing(),
            "Classic" => self.preset_classic(),
            _ => return false,
        }
        true
    }

    /// Localised landing page look: blue network, wide soft centre
    pub fn preset_landing(&mut self) {
        let seed = self.seed;
        *self = Self::default();
        self.seed = seed;
    }

    /// Original landing page look: faster gray network with a tighter, stronger centre fade
    pub fn preset_classic(&mut self) {
        self.preset_landing();
        self.motion.base_speed = 0.08;
        self.ellipse = EllipseFade {
            radius_x: 500.0,
            radius_y: 400.0,
            strength: 0.85,
            exponent: 1.2,
            floor: 0.05,
        };
        // Fixed hairline edges and fixed-size dots
        self.connections.min_width = 1.0;
        self.connections.width_range = 0.0;
        self.nodes = NodeStyle {
            min_radius: 2.2,
            radius_range: 0.0,
        };
        self.palette = Palette::gray();
    }

    /// Repair values the field cannot run with, logging each repair.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if !(self.connections.max_distance > 0.0) {
            log::warn!(
                "connection distance {} unusable, using {}",
                self.connections.max_distance,
                defaults.connections.max_distance
            );
            self.connections.max_distance = defaults.connections.max_distance;
        }
        // Neighbour-cell scanning misses pairs when a cell is narrower than the link distance
        if !(self.density.cell_size >= self.connections.max_distance) {
            log::warn!(
                "cell size {} below connection distance {}, raising it",
                self.density.cell_size,
                self.connections.max_distance
            );
            self.density.cell_size = self.connections.max_distance;
        }
        if !(self.motion.repulsion_radius > 0.0) {
            log::warn!("repulsion radius {} unusable, disabling repulsion", self.motion.repulsion_radius);
            self.motion.repulsion_radius = defaults.motion.repulsion_radius;
            self.motion.repulsion_strength = 0.0;
        }
        if self.density.max_per_cell < self.density.min_per_cell {
            log::warn!(
                "max per cell {} below min per cell {}, raising it",
                self.density.max_per_cell,
                self.density.min_per_cell
            );
            self.density.max_per_cell = self.density.min_per_cell;
        }
        if self.density.max_nodes < self.density.min_nodes {
            log::warn!(
                "max nodes {} below min nodes {}, raising it",
                self.density.max_nodes,
                self.density.min_nodes
            );
            self.density.max_nodes = self.density.min_nodes;
        }
        if !(self.density.reference_width > 0.0 && self.density.reference_height > 0.0) {
            log::warn!("reference viewport unusable, using 1920x1080");
            self.density.reference_width = defaults.density.reference_width;
            self.density.reference_height = defaults.density.reference_height;
        }
        if !(self.ellipse.radius_x > 0.0 && self.ellipse.radius_y > 0.0) {
            log::warn!("ellipse radii unusable, using defaults");
            self.ellipse.radius_x = defaults.ellipse.radius_x;
            self.ellipse.radius_y = defaults.ellipse.radius_y;
        }

        self.motion.damping = clamp_unit(self.motion.damping);
        self.motion.birth_fade_speed = clamp_unit(self.motion.birth_fade_speed);
        self.ellipse.strength = clamp_unit(self.ellipse.strength);
        self.ellipse.floor = clamp_unit(self.ellipse.floor);
        self
    }
}

// NaN maps to 0
fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
