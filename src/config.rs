//! Board configuration.
//!
//! All knobs have defaults matching the shop-floor board: Jerusalem time,
//! twenty undo steps, a 06:00–22:00 working day, and two render surfaces
//! (Gantt left-to-right with hourly snapping, Timeline right-to-left with
//! quarter-hour snapping).
//!
//! Configuration is plain data and may be loaded from JSON; any omitted
//! field keeps its default. A partial surface override is merged onto that
//! surface's own defaults, so `{"timeline": {"pixels_per_hour": 60}}` keeps
//! quarter-hour snapping and the mirrored axis.

use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::BoardError;
use crate::layout::Orientation;
use crate::time::DEFAULT_TIME_ZONE;

/// A render surface sharing the compressed day axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    Gantt,
    Timeline,
}

/// Geometry and gesture settings for one surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    /// Horizontal pixels per hour.
    pub pixels_per_hour: f64,
    /// Minimum rendered bar width in pixels.
    pub min_bar_width: f64,
    /// Drag snapping granularity in minutes.
    pub snap_minutes: u32,
    /// Shortest duration a resize may produce, in minutes.
    pub min_resize_minutes: u32,
    /// Screen direction of the time axis.
    pub orientation: Orientation,
}

impl SurfaceConfig {
    /// Gantt defaults: 40 px/h, whole-hour snapping, one-hour minimum.
    pub fn gantt() -> Self {
        Self {
            pixels_per_hour: 40.0,
            min_bar_width: 20.0,
            snap_minutes: 60,
            min_resize_minutes: 60,
            orientation: Orientation::LeftToRight,
        }
    }

    /// Timeline defaults: 40 px/h, quarter-hour snapping, mirrored axis.
    pub fn timeline() -> Self {
        Self {
            pixels_per_hour: 40.0,
            min_bar_width: 20.0,
            snap_minutes: 15,
            min_resize_minutes: 15,
            orientation: Orientation::RightToLeft,
        }
    }

    pub fn with_pixels_per_hour(mut self, pph: f64) -> Self {
        self.pixels_per_hour = pph;
        self
    }

    pub fn with_min_bar_width(mut self, width: f64) -> Self {
        self.min_bar_width = width;
        self
    }

    pub fn with_snap_minutes(mut self, minutes: u32) -> Self {
        self.snap_minutes = minutes;
        self
    }

    pub fn with_min_resize_minutes(mut self, minutes: u32) -> Self {
        self.min_resize_minutes = minutes;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Checks that the geometry can drive an axis and gestures.
    pub fn validate(&self, surface: Surface) -> Result<(), BoardError> {
        if !self.pixels_per_hour.is_finite() || self.pixels_per_hour <= 0.0 {
            return Err(BoardError::Config(format!(
                "{surface:?}: pixels_per_hour must be a positive number, got {}",
                self.pixels_per_hour
            )));
        }
        if !self.min_bar_width.is_finite() || self.min_bar_width < 0.0 {
            return Err(BoardError::Config(format!(
                "{surface:?}: min_bar_width must be a non-negative number, got {}",
                self.min_bar_width
            )));
        }
        if self.snap_minutes == 0 {
            return Err(BoardError::Config(format!(
                "{surface:?}: snap_minutes must be at least 1"
            )));
        }
        Ok(())
    }
}

/// A surface as written in configuration: every field optional.
#[derive(Debug, Default, Deserialize)]
struct SurfaceOverrides {
    pixels_per_hour: Option<f64>,
    min_bar_width: Option<f64>,
    snap_minutes: Option<u32>,
    min_resize_minutes: Option<u32>,
    orientation: Option<Orientation>,
}

impl SurfaceOverrides {
    fn apply(self, base: SurfaceConfig) -> SurfaceConfig {
        SurfaceConfig {
            pixels_per_hour: self.pixels_per_hour.unwrap_or(base.pixels_per_hour),
            min_bar_width: self.min_bar_width.unwrap_or(base.min_bar_width),
            snap_minutes: self.snap_minutes.unwrap_or(base.snap_minutes),
            min_resize_minutes: self.min_resize_minutes.unwrap_or(base.min_resize_minutes),
            orientation: self.orientation.unwrap_or(base.orientation),
        }
    }
}

fn gantt_surface<'de, D: Deserializer<'de>>(d: D) -> Result<SurfaceConfig, D::Error> {
    Ok(SurfaceOverrides::deserialize(d)?.apply(SurfaceConfig::gantt()))
}

fn timeline_surface<'de, D: Deserializer<'de>>(d: D) -> Result<SurfaceConfig, D::Error> {
    Ok(SurfaceOverrides::deserialize(d)?.apply(SurfaceConfig::timeline()))
}

/// Board-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Zone that job wall-clock times are expressed in.
    pub time_zone: Tz,
    /// Maximum retained undo snapshots.
    pub undo_capacity: usize,
    #[serde(deserialize_with = "gantt_surface")]
    pub gantt: SurfaceConfig,
    #[serde(deserialize_with = "timeline_surface")]
    pub timeline: SurfaceConfig,
    /// First hour of the working day (validation warning threshold).
    pub work_day_start_hour: u32,
    /// Last hour of the working day (validation warning threshold).
    pub work_day_end_hour: u32,
    /// Jobs shorter than this many minutes get a warning.
    pub short_job_minutes: i64,
    /// Jobs longer than this many minutes get a warning.
    pub long_job_minutes: i64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            time_zone: DEFAULT_TIME_ZONE,
            undo_capacity: 20,
            gantt: SurfaceConfig::gantt(),
            timeline: SurfaceConfig::timeline(),
            work_day_start_hour: 6,
            work_day_end_hour: 22,
            short_job_minutes: 15,
            long_job_minutes: 480,
        }
    }
}

impl BoardConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON configuration; omitted fields keep their
    /// defaults.
    pub fn from_json(raw: &str) -> Result<Self, BoardError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| BoardError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks both surfaces and the working-day hours.
    pub fn validate(&self) -> Result<(), BoardError> {
        self.gantt.validate(Surface::Gantt)?;
        self.timeline.validate(Surface::Timeline)?;
        if self.work_day_start_hour > 24 || self.work_day_end_hour > 24 {
            return Err(BoardError::Config(format!(
                "work day hours out of range: {}-{}",
                self.work_day_start_hour, self.work_day_end_hour
            )));
        }
        Ok(())
    }

    pub fn with_time_zone(mut self, tz: Tz) -> Self {
        self.time_zone = tz;
        self
    }

    pub fn with_undo_capacity(mut self, capacity: usize) -> Self {
        self.undo_capacity = capacity;
        self
    }

    pub fn with_gantt(mut self, surface: SurfaceConfig) -> Self {
        self.gantt = surface;
        self
    }

    pub fn with_timeline(mut self, surface: SurfaceConfig) -> Self {
        self.timeline = surface;
        self
    }

    /// Sets the working-day hours used for warnings.
    pub fn with_work_day(mut self, start_hour: u32, end_hour: u32) -> Self {
        self.work_day_start_hour = start_hour;
        self.work_day_end_hour = end_hour;
        self
    }

    /// Settings for one surface.
    pub fn surface(&self, surface: Surface) -> &SurfaceConfig {
        match surface {
            Surface::Gantt => &self.gantt,
            Surface::Timeline => &self.timeline,
        }
    }
}
