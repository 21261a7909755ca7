use crate::time::FixedTimestep;

/// Window and loop configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    /// Inner width in physical pixels.
    pub width: u32,
    /// Inner height in physical pixels.
    pub height: u32,
    pub resizable: bool,
    pub vsync: bool,
    /// Centre the window on the primary monitor when one is reported.
    pub centered: bool,
    /// Close the window when Escape is released.
    pub close_on_escape: bool,
    pub tick_rate_hz: f64,
    pub max_ticks_per_frame: u32,
}

impl RuntimeConfig {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    pub fn vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn centered(mut self, centered: bool) -> Self {
        self.centered = centered;
        self
    }

    pub fn close_on_escape(mut self, close: bool) -> Self {
        self.close_on_escape = close;
        self
    }

    pub fn tick_rate(mut self, hz: f64) -> Self {
        self.tick_rate_hz = hz;
        self
    }

    pub fn max_ticks_per_frame(mut self, max: u32) -> Self {
        self.max_ticks_per_frame = max;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "Arsia".to_string(),
            width: 1280,
            height: 720,
            resizable: false,
            vsync: true,
            centered: true,
            close_on_escape: true,
            tick_rate_hz: FixedTimestep::DEFAULT_TICK_RATE_HZ,
            max_ticks_per_frame: 1,
        }
    }
}
