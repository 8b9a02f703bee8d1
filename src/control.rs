//! Shared control state.
//!
//! All flags live in one atomic byte. Button latches flip bits with a single
//! `fetch_xor`, the render cycle takes a single `load` per tick, so neither
//! context can observe a half-applied toggle.

use core::sync::atomic::{AtomicU8, Ordering};

const AUX_LED_ON: u8 = 1 << 0;
const PWM_ENABLED: u8 = 1 << 1;
const BORDER_DOUBLE: u8 = 1 << 2;

/// Power-on value: red/blue LEDs follow the joystick, green LED off, plain border.
const POWER_ON: u8 = PWM_ENABLED;

/// Physical buttons wired to edge interrupts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonId {
    /// Joystick push switch: toggles the auxiliary LED and the border style.
    Joystick,
    /// Button A: toggles the red/blue PWM outputs.
    ButtonA,
}

impl ButtonId {
    const fn toggle_mask(self) -> u8 {
        match self {
            ButtonId::Joystick => AUX_LED_ON | BORDER_DOUBLE,
            ButtonId::ButtonA => PWM_ENABLED,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BorderStyle {
    /// One outline around the whole panel.
    Single,
    /// The full outline plus a second one inset from every edge.
    Double,
}

/// Consistent copy of the control flags, taken once per tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlSnapshot {
    pub aux_led_on: bool,
    pub pwm_enabled: bool,
    pub border_style: BorderStyle,
}

impl ControlSnapshot {
    const fn from_bits(bits: u8) -> Self {
        Self {
            aux_led_on: bits & AUX_LED_ON != 0,
            pwm_enabled: bits & PWM_ENABLED != 0,
            border_style: if bits & BORDER_DOUBLE != 0 {
                BorderStyle::Double
            } else {
                BorderStyle::Single
            },
        }
    }
}

impl Default for ControlSnapshot {
    fn default() -> Self {
        Self::from_bits(POWER_ON)
    }
}

/// Flags written by the button latches and read by the render cycle.
///
/// Only [`crate::ButtonLatch`] can toggle; everyone else gets [`snapshot`](Self::snapshot).
pub struct ControlState {
    flags: AtomicU8,
}

impl ControlState {
    pub const fn new() -> Self {
        Self { flags: AtomicU8::new(POWER_ON) }
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot::from_bits(self.flags.load(Ordering::Acquire))
    }

    /// Applies the toggle owned by `button` as one indivisible update.
    pub(crate) fn toggle(&self, button: ButtonId) {
        self.flags.fetch_xor(button.toggle_mask(), Ordering::AcqRel);
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new()
    }
}
