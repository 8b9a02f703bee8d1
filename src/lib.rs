//! SPDX-License-Identifier: MIT OR Apache-2.0
//!
//! # Joystick to LED and OLED mapping core
//!
//! Two execution contexts share one piece of state:
//! - **Edge interrupt:** [`LatchBank`] debounces button edges and toggles bits
//!   in [`ControlState`] (`debounce.rs`, `control.rs`).
//! - **Foreground loop:** [`RenderCycle`] samples the joystick, maps it to
//!   LED duty levels and a square position, and redraws the OLED every tick
//!   (`mapping.rs`, `render.rs`, `display.rs`).
//!
//! Everything here is hardware-agnostic; the RP2350 bring-up lives in the
//! firmware binary.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

mod config;
mod control;
mod debounce;
mod display;
mod mapping;
mod render;

pub use config::{Config, ADC_CENTER, ADC_MAX, LED_PWM_WRAP};
pub use control::{BorderStyle, ButtonId, ControlSnapshot, ControlState};
pub use debounce::{ButtonLatch, LatchBank};
pub use display::{Oled, Ssd1306Buffered};
pub use mapping::{derive_outputs, map_to_brightness, map_to_coordinate, AxisSample, DerivedOutputs};
pub use render::{
    draw_frame, AnalogSource, DisplaySink, LedChannel, MonotonicClock, OutputError, RenderCycle, RgbLeds, Ticker,
};
