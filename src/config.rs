//! # Configuration
//!
//! [`LifeConfig`] collects everything needed to start a run. Start from
//! `Default`, adjust with the `with_*` builders, or let [`LifeConfig::from_env`]
//! apply `LIFEGRID_*` overrides on top of the defaults.

use std::{fmt, str::FromStr};

use log::debug;

use crate::{
    error::{LifeError, Result},
    gfx::renderer::Palette,
    simulation::{
        cell_state::GridSize,
        patterns::Pattern,
        rule::{LifeRule, Neighborhood},
    },
};

/// Upper bound on the configured pacing; one step per frame caps it anyway
pub const MAX_GENERATIONS_PER_SECOND: f32 = 1000.0;

/// Which engine computes each generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepBackend {
    #[default]
    Gpu,
    Cpu,
}

impl fmt::Display for StepBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepBackend::Gpu => write!(f, "gpu"),
            StepBackend::Cpu => write!(f, "cpu"),
        }
    }
}

impl FromStr for StepBackend {
    type Err = LifeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gpu" => Ok(StepBackend::Gpu),
            "cpu" => Ok(StepBackend::Cpu),
            other => Err(LifeError::Config(format!("unknown backend '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LifeConfig {
    pub grid_width: u32,
    pub grid_height: u32,
    pub window_width: u32,
    pub window_height: u32,
    pub title: String,
    pub rule: LifeRule,
    pub neighborhood: Neighborhood,
    pub pattern: Pattern,
    pub generations_per_second: f32,
    pub palette: Palette,
    pub start_paused: bool,
    pub backend: StepBackend,
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            grid_width: 128,
            grid_height: 128,
            window_width: 1200,
            window_height: 800,
            title: "Lifegrid".to_string(),
            rule: LifeRule::CONWAY,
            neighborhood: Neighborhood::Moore,
            pattern: Pattern::Glider,
            generations_per_second: 10.0,
            palette: Palette::default(),
            start_paused: false,
            backend: StepBackend::Gpu,
        }
    }
}

impl LifeConfig {
    pub fn with_grid_size(mut self, width: u32, height: u32) -> Self {
        self.grid_width = width;
        self.grid_height = height;
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_rule(mut self, rule: LifeRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_neighborhood(mut self, neighborhood: Neighborhood) -> Self {
        self.neighborhood = neighborhood;
        self
    }

    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn with_rate(mut self, generations_per_second: f32) -> Self {
        self.generations_per_second = generations_per_second;
        self
    }

    pub fn with_start_paused(mut self, paused: bool) -> Self {
        self.start_paused = paused;
        self
    }

    pub fn with_backend(mut self, backend: StepBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn grid_size(&self) -> Result<GridSize> {
        GridSize::new(self.grid_width, self.grid_height)
    }

    /// Checks the values that cannot be enforced by type
    pub fn validate(&self) -> Result<()> {
        self.grid_size()?;
        if !(self.generations_per_second > 0.0
            && self.generations_per_second <= MAX_GENERATIONS_PER_SECOND)
        {
            return Err(LifeError::Config(format!(
                "generations per second must be in (0, {MAX_GENERATIONS_PER_SECOND}], got {}",
                self.generations_per_second
            )));
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(LifeError::Config(format!(
                "window size must be non-zero, got {}x{}",
                self.window_width, self.window_height
            )));
        }
        if let Pattern::Random { density, .. } = self.pattern {
            if !(0.0..=1.0).contains(&density) {
                return Err(LifeError::Config(format!(
                    "random density must be in [0, 1], got {density}"
                )));
            }
        }
        Ok(())
    }

    /// Defaults overridden by any `LIFEGRID_*` variables in the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `LIFEGRID_*` key
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(width) = lookup("LIFEGRID_WIDTH") {
            config.grid_width = parse_number("LIFEGRID_WIDTH", &width)?;
        }
        if let Some(height) = lookup("LIFEGRID_HEIGHT") {
            config.grid_height = parse_number("LIFEGRID_HEIGHT", &height)?;
        }
        if let Some(width) = lookup("LIFEGRID_WINDOW_WIDTH") {
            let width = parse_number("LIFEGRID_WINDOW_WIDTH", &width)?;
            let window_height = config.window_height;
            config = config.with_window_size(width, window_height);
        }
        if let Some(height) = lookup("LIFEGRID_WINDOW_HEIGHT") {
            let height = parse_number("LIFEGRID_WINDOW_HEIGHT", &height)?;
            let window_width = config.window_width;
            config = config.with_window_size(window_width, height);
        }
        if let Some(rule) = lookup("LIFEGRID_RULE") {
            config = config.with_rule(rule.parse()?);
        }
        if let Some(neighborhood) = lookup("LIFEGRID_NEIGHBORHOOD") {
            config = config.with_neighborhood(neighborhood.parse()?);
        }
        if let Some(pattern) = lookup("LIFEGRID_PATTERN") {
            config.pattern = pattern.parse()?;
        }
        if let Some(rate) = lookup("LIFEGRID_RATE") {
            config.generations_per_second = parse_number("LIFEGRID_RATE", &rate)?;
        }
        if let Some(backend) = lookup("LIFEGRID_BACKEND") {
            config.backend = backend.parse()?;
        }
        if let Some(paused) = lookup("LIFEGRID_PAUSED") {
            config.start_paused = parse_flag("LIFEGRID_PAUSED", &paused)?;
        }

        config.validate()?;
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| LifeError::Config(format!("{key}: '{value}' is not a valid number")))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(LifeError::Config(format!("{key}: '{value}' is not a flag"))),
    }
}
