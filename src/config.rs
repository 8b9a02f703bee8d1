//! Compile-time configuration for the mapping loop.

/// PWM counter wrap for every LED channel (8-bit resolution).
pub const LED_PWM_WRAP: u16 = 255;

/// Largest value the 12-bit ADC can report.
pub const ADC_MAX: u16 = 4095;

/// ADC reading of a joystick axis at rest.
pub const ADC_CENTER: u16 = 2048;

/// Geometry and timing of the loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub display_width: u16,
    pub display_height: u16,
    /// Side length of the square that follows the joystick.
    pub square_size: u16,
    /// Distance of the second outline from the display edge.
    pub border_inset: u16,
    /// Minimum time between two accepted presses of one button.
    pub debounce_window_us: u32,
    pub tick_period_us: u32,
    pub x_channel: u8,
    pub y_channel: u8,
}

impl Config {
    pub const DEFAULT: Self = Self {
        display_width: 128,
        display_height: 64,
        square_size: 8,
        border_inset: 2,
        debounce_window_us: 200_000,
        tick_period_us: 50_000,
        x_channel: 0,
        y_channel: 1,
    };

    /// Rightmost x at which the square still fits on screen.
    pub const fn square_max_x(&self) -> u16 {
        self.display_width.saturating_sub(self.square_size)
    }

    /// Lowest y at which the square still fits on screen.
    pub const fn square_max_y(&self) -> u16 {
        self.display_height.saturating_sub(self.square_size)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_square_bounds_fit_the_panel() {
        let config = Config::default();
        assert_eq!(config.square_max_x(), 120);
        assert_eq!(config.square_max_y(), 56);
    }

    #[test]
    fn oversized_square_pins_to_origin() {
        let config = Config { square_size: 200, ..Config::DEFAULT };
        assert_eq!(config.square_max_x(), 0);
        assert_eq!(config.square_max_y(), 0);
    }
}
