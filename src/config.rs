//! Window and loop settings handed to [`Game::new`](crate::flow::Game::new).

use anyhow::{Result, bail};
use instant::Duration;

use crate::data_structures::color::Color;

#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// Append the measured FPS to the window title and greet on start.
    pub show_credits: bool,
    pub vsync: bool,
    pub resizable: bool,
    /// Fixed time step. `None` runs as fast as the surface presents.
    pub target_fps: Option<u32>,
    pub clear_colour: Color,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "flow-hooks".to_string(),
            show_credits: true,
            vsync: true,
            resizable: false,
            target_fps: None,
            clear_colour: Color::BLACK,
        }
    }
}

impl GameConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_credits(mut self, show_credits: bool) -> Self {
        self.show_credits = show_credits;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    pub fn with_target_fps(mut self, target_fps: u32) -> Self {
        self.target_fps = Some(target_fps);
        self
    }

    pub fn with_clear_colour(mut self, clear_colour: Color) -> Self {
        self.clear_colour = clear_colour;
        self
    }

    /// Duration of one fixed step, if a target FPS is set.
    pub fn target_frame_time(&self) -> Option<Duration> {
        self.target_fps
            .filter(|fps| *fps > 0)
            .map(|fps| Duration::from_nanos(1_000_000_000 / fps as u64))
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            bail!(
                "window size must be non-zero, got {}x{}",
                self.width,
                self.height
            );
        }
        if self.target_fps == Some(0) {
            bail!("target fps must be greater than zero");
        }
        Ok(())
    }
}
