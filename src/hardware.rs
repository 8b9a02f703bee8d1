//! Hardware Abstraction Module
//!
//! This module handles the low-level configuration of the RP2350 peripherals.
//! It encapsulates the setup of Clocks, PLLs, Timer, ADC, PWM slices, I2C and
//! the button GPIOs, and adapts them to the collaborator traits of the
//! mapping core.

use embedded_hal::delay::DelayNs;
use embedded_hal::pwm::SetDutyCycle;
use embedded_hal_0_2::adc::OneShot;
use rp235x_hal as hal;
use hal::fugit::RateExtU32;
use hal::gpio::Interrupt::EdgeLow;
use hal::pac;
use ssd1306::{prelude::*, I2CDisplayInterface, Ssd1306};

use joystick_oled::{AnalogSource, DisplaySink, MonotonicClock, Oled, RgbLeds, ADC_CENTER, LED_PWM_WRAP};

/// External crystal frequency used by the Raspberry Pi Pico 2.
const XTAL_FREQ_HZ: u32 = 12_000_000u32;

/// SSD1306 bus speed.
const I2C_FREQ_KHZ: u32 = 100;

pub type JoystickButtonPin = hal::gpio::Pin<
    hal::gpio::bank0::Gpio22,
    hal::gpio::FunctionSio<hal::gpio::SioInput>,
    hal::gpio::PullUp,
>;

pub type ButtonAPin = hal::gpio::Pin<
    hal::gpio::bank0::Gpio5,
    hal::gpio::FunctionSio<hal::gpio::SioInput>,
    hal::gpio::PullUp,
>;

/// Button inputs, armed for falling-edge interrupts.
pub struct ButtonPins {
    pub joystick: JoystickButtonPin,
    pub button_a: ButtonAPin,
}

/// The 64-bit microsecond timer, seen as a wrapping 32-bit clock.
#[derive(Clone, Copy)]
pub struct MicrosTimer(hal::Timer<hal::timer::CopyableTimer0>);

impl MonotonicClock for MicrosTimer {
    fn now_micros(&self) -> u32 {
        // Low word only, like the SDK's time_us_32()
        self.0.get_counter().ticks() as u32
    }
}

impl DelayNs for MicrosTimer {
    fn delay_ns(&mut self, ns: u32) {
        self.0.delay_ns(ns);
    }

    fn delay_us(&mut self, us: u32) {
        self.0.delay_us(us);
    }
}

/// ADC input wired to the joystick's X axis (GPIO26).
const X_AXIS_CHANNEL: u8 = 0;

/// ADC input wired to the joystick's Y axis (GPIO27).
const Y_AXIS_CHANNEL: u8 = 1;

/// Blocking single-shot reads through the HAL's `OneShot` driver.
///
/// Owns both analog pins so the pads stay in analog mode for the life of the
/// program. `select_channel` only records which pin the next read converts.
pub struct JoystickAdc<X, Y> {
    adc: hal::Adc,
    x_pin: X,
    y_pin: Y,
    selected: u8,
}

impl<X, Y> AnalogSource for JoystickAdc<X, Y>
where
    hal::Adc: OneShot<hal::Adc, u16, X> + OneShot<hal::Adc, u16, Y>,
{
    fn select_channel(&mut self, channel: u8) {
        self.selected = channel;
    }

    fn read_sample(&mut self) -> u16 {
        let adc = &mut self.adc;
        let sample = match self.selected {
            X_AXIS_CHANNEL => nb::block!(OneShot::<hal::Adc, u16, X>::read(adc, &mut self.x_pin)).ok(),
            Y_AXIS_CHANNEL => nb::block!(OneShot::<hal::Adc, u16, Y>::read(adc, &mut self.y_pin)).ok(),
            _ => None,
        };
        // A centred stick leaves every output at rest
        sample.unwrap_or(ADC_CENTER)
    }
}

/// Initializes the entire hardware stack.
///
/// This function:
/// 1.  Takes ownership of the raw PAC peripherals.
/// 2.  Configures the Watchdog and Clocks.
/// 3.  Initializes the Microsecond Timer.
/// 4.  Configures the joystick ADC pins (GPIO26 = ch0, GPIO27 = ch1).
/// 5.  Configures PWM for the red (GPIO11), blue (GPIO12) and green (GPIO13) LEDs.
/// 6.  Brings up the SSD1306 on I2C1 (GPIO14 SDA, GPIO15 SCL).
/// 7.  Configures the buttons (GPIO22, GPIO5) with pull-ups and falling-edge interrupts.
///
/// The GPIO bank interrupt is left masked; `main` unmasks it once the
/// handler's state is published.
///
/// # Returns
/// A tuple containing the collaborators needed by `main`:
/// `(JoystickAdc, RgbLeds, Oled, ButtonPins, MicrosTimer)`.
pub fn init() -> (
    impl AnalogSource,
    RgbLeds<impl SetDutyCycle, impl SetDutyCycle, impl SetDutyCycle>,
    impl DisplaySink,
    ButtonPins,
    MicrosTimer,
) {
    // 1. Take ownership of raw peripherals
    let mut pac = pac::Peripherals::take().unwrap();
    let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);

    // 2. Configure Clocks
    let clocks = hal::clocks::init_clocks_and_plls(
        XTAL_FREQ_HZ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .unwrap();

    // 3. Configure Timer (Microsecond precision)
    let timer = hal::Timer::new_timer0(pac.TIMER0, &mut pac.RESETS, &clocks);

    let sio = hal::Sio::new(pac.SIO);
    let pins = hal::gpio::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    // 4. Configure ADC (blocking one-shot, channel picked per read)
    let adc = hal::Adc::new(pac.ADC, &mut pac.RESETS);
    let x_pin = hal::adc::AdcPin::new(pins.gpio26).unwrap();
    let y_pin = hal::adc::AdcPin::new(pins.gpio27).unwrap();

    // 5. Configure PWM: wrap at LED_PWM_WRAP, divider 1
    let pwm_slices = hal::pwm::Slices::new(pac.PWM, &mut pac.RESETS);

    let mut pwm5 = pwm_slices.pwm5;
    pwm5.set_top(LED_PWM_WRAP);
    pwm5.set_div_int(1);
    pwm5.enable();
    let mut red = pwm5.channel_b;
    let _ = red.output_to(pins.gpio11);

    let mut pwm6 = pwm_slices.pwm6;
    pwm6.set_top(LED_PWM_WRAP);
    pwm6.set_div_int(1);
    pwm6.enable();
    let mut blue = pwm6.channel_a;
    let _ = blue.output_to(pins.gpio12);
    let mut green = pwm6.channel_b;
    let _ = green.output_to(pins.gpio13);

    let leds = RgbLeds::new(red, blue, green);

    // 6. Configure the OLED
    let sda_pin: hal::gpio::Pin<_, hal::gpio::FunctionI2C, hal::gpio::PullUp> = pins.gpio14.reconfigure();
    let scl_pin: hal::gpio::Pin<_, hal::gpio::FunctionI2C, hal::gpio::PullUp> = pins.gpio15.reconfigure();
    let i2c = hal::I2C::i2c1(
        pac.I2C1,
        sda_pin,
        scl_pin,
        I2C_FREQ_KHZ.kHz(),
        &mut pac.RESETS,
        &clocks.system_clock,
    );
    let interface = I2CDisplayInterface::new(i2c);
    let display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
        .into_buffered_graphics_mode();
    let oled = Oled::new(display).unwrap();

    // 7. Configure buttons
    let mut joystick = pins.gpio22.into_pull_up_input();
    joystick.set_interrupt_enabled(EdgeLow, true);
    let mut button_a = pins.gpio5.into_pull_up_input();
    button_a.set_interrupt_enabled(EdgeLow, true);

    // Return ready-to-use hardware
    (
        JoystickAdc { adc, x_pin, y_pin, selected: X_AXIS_CHANNEL },
        leds,
        oled,
        ButtonPins { joystick, button_a },
        MicrosTimer(timer),
    )
}
