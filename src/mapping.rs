//! Analog sample to output mapping. Pure functions, no state.

use crate::config::{Config, ADC_CENTER, ADC_MAX, LED_PWM_WRAP};
use crate::control::ControlSnapshot;

/// One reading of both joystick axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisSample {
    pub x: u16,
    pub y: u16,
}

/// Everything a tick pushes to the LEDs and the display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DerivedOutputs {
    pub brightness_red: u8,
    pub brightness_blue: u8,
    /// Duty level of the auxiliary (green) LED: zero or the full PWM wrap.
    pub brightness_aux: u16,
    pub square_x: u16,
    pub square_y: u16,
}

/// Scales a 12-bit sample linearly onto `0..=max_coord`.
pub fn map_to_coordinate(sample: u16, max_coord: u16) -> u16 {
    let sample = u32::from(sample.min(ADC_MAX));
    let scaled = sample * u32::from(max_coord) / u32::from(ADC_MAX);
    // Fits: scaled <= max_coord
    scaled.min(u32::from(max_coord)) as u16
}

/// Brightness from the distance to the axis center.
///
/// Zero at 2048, 255 at 0 and 254 at 4095: the top end is one step short
/// because 4095 sits 2047 away from center.
pub fn map_to_brightness(sample: u16) -> u8 {
    let diff = u32::from(sample.min(ADC_MAX).abs_diff(ADC_CENTER));
    let brightness = diff * 255 / u32::from(ADC_CENTER);
    brightness.min(255) as u8
}

/// Computes the outputs of one tick.
pub fn derive_outputs(sample: AxisSample, control: ControlSnapshot, config: &Config) -> DerivedOutputs {
    let (brightness_red, brightness_blue) = if control.pwm_enabled {
        (map_to_brightness(sample.x), map_to_brightness(sample.y))
    } else {
        (0, 0)
    };

    DerivedOutputs {
        brightness_red,
        brightness_blue,
        brightness_aux: if control.aux_led_on { LED_PWM_WRAP } else { 0 },
        square_x: map_to_coordinate(sample.x, config.square_max_x()),
        square_y: map_to_coordinate(sample.y, config.square_max_y()),
    }
}
