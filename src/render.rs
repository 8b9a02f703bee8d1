//! Foreground render/output cycle.
//!
//! Once per tick: sample both axes, snapshot the control flags, derive the
//! outputs, push three PWM duty levels and redraw the frame. The cycle only
//! reads [`ControlState`]; button latches are never called from here.

use embedded_hal::delay::DelayNs;
use embedded_hal::pwm::{Error as _, ErrorKind, SetDutyCycle};

use crate::config::Config;
use crate::control::{BorderStyle, ControlSnapshot, ControlState};
use crate::mapping::{derive_outputs, AxisSample, DerivedOutputs};

/// Multiplexed single-shot ADC.
pub trait AnalogSource {
    fn select_channel(&mut self, channel: u8);
    /// Converts the selected channel. 12-bit result.
    fn read_sample(&mut self) -> u16;
}

/// Monochrome frame buffer with explicit flush.
pub trait DisplaySink {
    type Error: core::fmt::Debug;

    /// Blanks the back-buffer.
    fn clear(&mut self) -> Result<(), Self::Error>;
    fn draw_rect_outline(&mut self, x: u16, y: u16, width: u16, height: u16) -> Result<(), Self::Error>;
    fn draw_filled_rect(&mut self, x: u16, y: u16, width: u16, height: u16) -> Result<(), Self::Error>;
    /// Sends the back-buffer to the panel.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Free-running microsecond counter, truncated to 32 bits.
pub trait MonotonicClock {
    fn now_micros(&self) -> u32;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedChannel {
    Red,
    Blue,
    Aux,
}

/// A collaborator call failed; the rest of that tick was skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputError<E> {
    Pwm(LedChannel, ErrorKind),
    Display(E),
}

/// The three PWM-driven LEDs.
pub struct RgbLeds<R, B, G> {
    pub red: R,
    pub blue: B,
    /// Auxiliary LED, on or off only.
    pub aux: G,
}

impl<R, B, G> RgbLeds<R, B, G>
where
    R: SetDutyCycle,
    B: SetDutyCycle,
    G: SetDutyCycle,
{
    pub fn new(red: R, blue: B, aux: G) -> Self {
        Self { red, blue, aux }
    }

    /// One duty update per channel, red first. No ordering guarantee is made to observers.
    pub fn apply(&mut self, outputs: &DerivedOutputs) -> Result<(), (LedChannel, ErrorKind)> {
        self.red
            .set_duty_cycle(u16::from(outputs.brightness_red))
            .map_err(|e| (LedChannel::Red, e.kind()))?;
        self.blue
            .set_duty_cycle(u16::from(outputs.brightness_blue))
            .map_err(|e| (LedChannel::Blue, e.kind()))?;
        self.aux
            .set_duty_cycle(outputs.brightness_aux)
            .map_err(|e| (LedChannel::Aux, e.kind()))?;
        Ok(())
    }
}

/// Draws one complete frame and flushes it.
pub fn draw_frame<D: DisplaySink>(
    display: &mut D,
    outputs: &DerivedOutputs,
    border: BorderStyle,
    config: &Config,
) -> Result<(), D::Error> {
    let (width, height) = (config.display_width, config.display_height);

    display.clear()?;
    display.draw_rect_outline(0, 0, width, height)?;
    if border == BorderStyle::Double {
        let inset = config.border_inset;
        display.draw_rect_outline(
            inset,
            inset,
            width.saturating_sub(inset.saturating_mul(2)),
            height.saturating_sub(inset.saturating_mul(2)),
        )?;
    }
    display.draw_filled_rect(outputs.square_x, outputs.square_y, config.square_size, config.square_size)?;
    display.flush()
}

/// Fixed-period tick bookkeeping.
#[derive(Clone, Copy, Debug)]
pub struct Ticker {
    period_us: u32,
    started_at: u32,
}

impl Ticker {
    pub const fn new(period_us: u32) -> Self {
        Self { period_us, started_at: 0 }
    }

    /// Marks the start of a tick.
    pub fn begin(&mut self, now_us: u32) {
        self.started_at = now_us;
    }

    /// Time left in the current tick; zero once the tick has overrun.
    pub fn remaining(&self, now_us: u32) -> u32 {
        self.period_us.saturating_sub(now_us.wrapping_sub(self.started_at))
    }
}

/// The foreground loop and the collaborators it drives.
pub struct RenderCycle<'a, A, R, B, G, D> {
    pub analog: A,
    pub leds: RgbLeds<R, B, G>,
    pub display: D,
    config: Config,
    control: &'a ControlState,
    last_seen: Option<ControlSnapshot>,
}

impl<'a, A, R, B, G, D> RenderCycle<'a, A, R, B, G, D>
where
    A: AnalogSource,
    R: SetDutyCycle,
    B: SetDutyCycle,
    G: SetDutyCycle,
    D: DisplaySink,
{
    pub fn new(analog: A, leds: RgbLeds<R, B, G>, display: D, config: Config, control: &'a ControlState) -> Self {
        Self { analog, leds, display, config, control, last_seen: None }
    }

    /// Reads X then Y. The two conversions are sequential, not simultaneous.
    pub fn sample_axes(&mut self) -> AxisSample {
        self.analog.select_channel(self.config.x_channel);
        let x = self.analog.read_sample();
        self.analog.select_channel(self.config.y_channel);
        let y = self.analog.read_sample();
        AxisSample { x, y }
    }

    /// Runs one tick without sleeping.
    pub fn tick(&mut self) -> Result<DerivedOutputs, OutputError<D::Error>> {
        let sample = self.sample_axes();
        let control = self.control.snapshot();
        self.note_control_change(control);

        let outputs = derive_outputs(sample, control, &self.config);
        self.leds
            .apply(&outputs)
            .map_err(|(channel, kind)| OutputError::Pwm(channel, kind))?;
        draw_frame(&mut self.display, &outputs, control.border_style, &self.config)
            .map_err(OutputError::Display)?;

        Ok(outputs)
    }

    /// Ticks forever, sleeping out the rest of each period.
    pub fn run<T>(mut self, timer: &mut T) -> !
    where
        T: MonotonicClock + DelayNs,
    {
        info!("render loop started, period {=u32}us", self.config.tick_period_us);
        let mut ticker = Ticker::new(self.config.tick_period_us);

        loop {
            ticker.begin(timer.now_micros());

            match self.tick() {
                Ok(outputs) => trace!(
                    "red={=u8} blue={=u8} square=({=u16},{=u16})",
                    outputs.brightness_red,
                    outputs.brightness_blue,
                    outputs.square_x,
                    outputs.square_y
                ),
                Err(OutputError::Pwm(channel, _)) => warn!("pwm update failed on {}", channel),
                Err(OutputError::Display(_)) => warn!("display update failed"),
            }

            timer.delay_us(ticker.remaining(timer.now_micros()));
        }
    }

    fn note_control_change(&mut self, control: ControlSnapshot) {
        if self.last_seen == Some(control) {
            return;
        }
        info!(
            "aux led {}, pwm {}, border {}",
            control.aux_led_on,
            control.pwm_enabled,
            control.border_style
        );
        self.last_seen = Some(control);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::pwm::ErrorType;

    struct FixedAdc {
        channels: [u16; 2],
        selected: usize,
        reads: Vec<u8>,
    }

    impl FixedAdc {
        fn new(x: u16, y: u16) -> Self {
            Self { channels: [x, y], selected: 0, reads: Vec::new() }
        }
    }

    impl AnalogSource for FixedAdc {
        fn select_channel(&mut self, channel: u8) {
            self.selected = usize::from(channel);
        }

        fn read_sample(&mut self) -> u16 {
            self.reads.push(self.selected as u8);
            self.channels[self.selected]
        }
    }

    #[derive(Default)]
    struct Led {
        duty: Option<u16>,
    }

    impl ErrorType for Led {
        type Error = Infallible;
    }

    impl SetDutyCycle for Led {
        fn max_duty_cycle(&self) -> u16 {
            255
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
            self.duty = Some(duty);
            Ok(())
        }
    }

    #[derive(Debug)]
    struct StuckLed;

    impl embedded_hal::pwm::Error for StuckLed {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    impl ErrorType for StuckLed {
        type Error = StuckLed;
    }

    impl SetDutyCycle for StuckLed {
        fn max_duty_cycle(&self) -> u16 {
            255
        }

        fn set_duty_cycle(&mut self, _duty: u16) -> Result<(), Self::Error> {
            Err(StuckLed)
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Draw {
        Clear,
        Outline(u16, u16, u16, u16),
        Filled(u16, u16, u16, u16),
        Flush,
    }

    #[derive(Default)]
    struct RecordingDisplay {
        ops: Vec<Draw>,
        fail_flush: bool,
    }

    impl DisplaySink for RecordingDisplay {
        type Error = &'static str;

        fn clear(&mut self) -> Result<(), Self::Error> {
            self.ops.clear();
            self.ops.push(Draw::Clear);
            Ok(())
        }

        fn draw_rect_outline(&mut self, x: u16, y: u16, width: u16, height: u16) -> Result<(), Self::Error> {
            self.ops.push(Draw::Outline(x, y, width, height));
            Ok(())
        }

        fn draw_filled_rect(&mut self, x: u16, y: u16, width: u16, height: u16) -> Result<(), Self::Error> {
            self.ops.push(Draw::Filled(x, y, width, height));
            Ok(())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            if self.fail_flush {
                return Err("nak");
            }
            self.ops.push(Draw::Flush);
            Ok(())
        }
    }

    fn cycle(state: &ControlState, x: u16, y: u16) -> RenderCycle<'_, FixedAdc, Led, Led, Led, RecordingDisplay> {
        RenderCycle::new(
            FixedAdc::new(x, y),
            RgbLeds::new(Led::default(), Led::default(), Led::default()),
            RecordingDisplay::default(),
            Config::DEFAULT,
            state,
        )
    }

    #[test]
    fn tick_reads_x_then_y() {
        let state = ControlState::new();
        let mut cycle = cycle(&state, 0, 4095);

        let sample = cycle.sample_axes();
        assert_eq!(sample, AxisSample { x: 0, y: 4095 });
        assert_eq!(cycle.analog.reads, vec![0, 1]);
    }

    #[test]
    fn tick_pushes_all_three_duty_levels() {
        let state = ControlState::new();
        let mut cycle = cycle(&state, 0, 4095);

        let outputs = cycle.tick().unwrap();
        assert_eq!(cycle.leds.red.duty, Some(255));
        assert_eq!(cycle.leds.blue.duty, Some(254));
        assert_eq!(cycle.leds.aux.duty, Some(0));
        assert_eq!(outputs.brightness_red, 255);
    }

    #[test]
    fn disabled_pwm_keeps_red_and_blue_dark() {
        let state = ControlState::new();
        state.toggle(crate::ButtonId::ButtonA);
        let mut cycle = cycle(&state, 0, 4095);

        cycle.tick().unwrap();
        assert_eq!(cycle.leds.red.duty, Some(0));
        assert_eq!(cycle.leds.blue.duty, Some(0));
        assert_eq!(cycle.leds.aux.duty, Some(0));

        state.toggle(crate::ButtonId::Joystick);
        cycle.tick().unwrap();
        assert_eq!(cycle.leds.red.duty, Some(0));
        assert_eq!(cycle.leds.aux.duty, Some(255));
    }

    #[test]
    fn single_border_frame() {
        let state = ControlState::new();
        let mut cycle = cycle(&state, 2048, 2048);

        cycle.tick().unwrap();
        assert_eq!(
            cycle.display.ops,
            vec![Draw::Clear, Draw::Outline(0, 0, 128, 64), Draw::Filled(60, 28, 8, 8), Draw::Flush]
        );
    }

    #[test]
    fn border_styles_differ_only_by_inset_outline() {
        let state = ControlState::new();
        let mut cycle = cycle(&state, 1000, 3000);

        cycle.tick().unwrap();
        let single = cycle.display.ops.clone();

        state.toggle(crate::ButtonId::Joystick);
        cycle.tick().unwrap();
        let double = cycle.display.ops.clone();

        let inset = Draw::Outline(2, 2, 124, 60);
        assert_eq!(double.len(), single.len() + 1);
        assert_eq!(double.iter().filter(|op| **op == inset).count(), 1);
        let without_inset: Vec<Draw> = double.into_iter().filter(|op| *op != inset).collect();
        assert_eq!(without_inset, single);
    }

    #[test]
    fn oversized_inset_collapses_the_inner_outline() {
        let config = Config { border_inset: 40_000, ..Config::DEFAULT };
        let outputs = derive_outputs(AxisSample { x: 0, y: 0 }, ControlState::new().snapshot(), &config);
        let mut display = RecordingDisplay::default();

        draw_frame(&mut display, &outputs, BorderStyle::Double, &config).unwrap();
        assert_eq!(display.ops[2], Draw::Outline(40_000, 40_000, 0, 0));
        assert_eq!(display.ops.last(), Some(&Draw::Flush));
    }

    #[test]
    fn pwm_failure_aborts_the_tick() {
        let state = ControlState::new();
        let mut cycle = RenderCycle::new(
            FixedAdc::new(0, 0),
            RgbLeds::new(Led::default(), StuckLed, Led::default()),
            RecordingDisplay::default(),
            Config::DEFAULT,
            &state,
        );

        assert_eq!(cycle.tick(), Err(OutputError::Pwm(LedChannel::Blue, ErrorKind::Other)));
        assert_eq!(cycle.leds.red.duty, Some(255));
        assert_eq!(cycle.leds.aux.duty, None);
        assert!(cycle.display.ops.is_empty());
    }

    #[test]
    fn display_failure_is_reported() {
        let state = ControlState::new();
        let mut cycle = cycle(&state, 0, 0);
        cycle.display.fail_flush = true;

        assert_eq!(cycle.tick(), Err(OutputError::Display("nak")));
    }

    #[test]
    fn ticker_sleeps_out_the_period() {
        let mut ticker = Ticker::new(50_000);
        ticker.begin(1_000);
        assert_eq!(ticker.remaining(1_000), 50_000);
        assert_eq!(ticker.remaining(13_000), 38_000);
        assert_eq!(ticker.remaining(51_000), 0);
        assert_eq!(ticker.remaining(90_000), 0);
    }

    #[test]
    fn ticker_handles_clock_wraparound() {
        let mut ticker = Ticker::new(50_000);
        ticker.begin(u32::MAX - 9_999);
        assert_eq!(ticker.remaining(20_000), 20_000);
    }
}
