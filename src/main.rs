//! SPDX-License-Identifier: MIT OR Apache-2.0
//!
//! # Joystick to RGB LED and OLED Mapper
//!
//! Two analog joystick axes drive the brightness of the red and blue LEDs and
//! the position of a square on a 128x64 SSD1306. Two buttons, debounced in the
//! GPIO interrupt, toggle the green LED plus the display border (joystick
//! button) and the red/blue PWM outputs (button A).
//!
//! - **Hardware Module:** HAL setup and collaborator adapters (`hardware.rs`).
//! - **Interrupt:** `IO_IRQ_BANK0` feeds button edges to the debounce latches.
//! - **Foreground:** the render cycle polls the control flags every 50 ms.
//!
//! Target: Raspberry Pi Pico 2 (RP2350).

#![no_std]
#![no_main]

// --- Imports ---
use core::cell::RefCell;
use critical_section::Mutex;
use defmt::*;
use defmt_rtt as _;
use panic_probe as _;

use joystick_oled::{ButtonId, Config, ControlState, LatchBank, MonotonicClock, RenderCycle};

// --- Modules ---
mod hardware;
use hardware::{ButtonPins, MicrosTimer};

// --- HAL Selection ---
use rp235x_hal as hal;
use hal::entry;
use hal::gpio::Interrupt::EdgeLow;
use hal::pac;

// Select appropriate interrupt macro based on chip architecture
use rp235x_hal::pac::interrupt;

// --- Bootloader Configuration ---

#[unsafe(link_section = ".start_block")]
#[used]
pub static IMAGE_DEF: hal::block::ImageDef = hal::block::ImageDef::secure_exe();

// --- Shared State ---

/// Written by the GPIO interrupt, read by the render cycle.
static CONTROL: ControlState = ControlState::new();

/// Everything the GPIO interrupt owns.
struct ButtonIrq {
    pins: ButtonPins,
    latches: LatchBank,
    clock: MicrosTimer,
}

static BUTTON_IRQ: Mutex<RefCell<Option<ButtonIrq>>> = Mutex::new(RefCell::new(None));

/// Entry point.
#[entry]
fn main() -> ! {
    info!("Program start");
    let config = Config::DEFAULT;

    // 1. Initialize Hardware Stack (Clocks, Timer, ADC, PWM, OLED, buttons)
    let (analog, leds, display, buttons, mut timer) = hardware::init();

    // 2. Publish button state to the interrupt, then let edges through
    critical_section::with(|cs| {
        BUTTON_IRQ.borrow_ref_mut(cs).replace(ButtonIrq {
            pins: buttons,
            latches: LatchBank::new(config.debounce_window_us),
            clock: timer,
        });
    });

    unsafe {
        cortex_m::peripheral::NVIC::unmask(pac::Interrupt::IO_IRQ_BANK0);
    }

    // 3. Main Application Loop
    RenderCycle::new(analog, leds, display, config, &CONTROL).run(&mut timer)
}

// --- Interrupt Handlers ---

#[allow(non_snake_case)]
#[interrupt]
fn IO_IRQ_BANK0() {
    critical_section::with(|cs| {
        let mut irq_guard = BUTTON_IRQ.borrow_ref_mut(cs);
        let Some(irq) = irq_guard.as_mut() else {
            return;
        };
        let now = irq.clock.now_micros();

        if irq.pins.joystick.interrupt_status(EdgeLow) {
            irq.pins.joystick.clear_interrupt(EdgeLow);
            if irq.latches.on_edge_event(ButtonId::Joystick, now, &CONTROL) {
                debug!("joystick button toggled");
            }
        }

        if irq.pins.button_a.interrupt_status(EdgeLow) {
            irq.pins.button_a.clear_interrupt(EdgeLow);
            if irq.latches.on_edge_event(ButtonId::ButtonA, now, &CONTROL) {
                debug!("button A toggled");
            }
        }
    });
}

// --- Metadata ---

#[unsafe(link_section = ".bi_entries")]
#[used]
pub static PICOTOOL_ENTRIES: [hal::binary_info::EntryAddr; 4] = [
    hal::binary_info::rp_cargo_bin_name!(),
    hal::binary_info::rp_cargo_version!(),
    hal::binary_info::rp_program_description!(c"Joystick to LED and OLED mapper"),
    hal::binary_info::rp_program_build_attribute!()
];
