//! SSD1306 128x64 OLED as a [`DisplaySink`].

use display_interface::{DisplayError, WriteOnlyDataCommand};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, StrokeAlignment};
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::Ssd1306;

use crate::render::DisplaySink;

pub type Ssd1306Buffered<DI> = Ssd1306<DI, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

/// Buffered SSD1306 driver. Drawing only touches RAM until [`DisplaySink::flush`].
pub struct Oled<DI> {
    display: Ssd1306Buffered<DI>,
}

impl<DI: WriteOnlyDataCommand> Oled<DI> {
    /// Initializes the controller and shows a blank screen.
    pub fn new(mut display: Ssd1306Buffered<DI>) -> Result<Self, DisplayError> {
        display.init()?;
        let mut oled = Self { display };
        oled.clear()?;
        oled.flush()?;
        Ok(oled)
    }

    fn rect(x: u16, y: u16, width: u16, height: u16) -> Rectangle {
        Rectangle::new(
            Point::new(i32::from(x), i32::from(y)),
            Size::new(u32::from(width), u32::from(height)),
        )
    }
}

impl<DI: WriteOnlyDataCommand> DisplaySink for Oled<DI> {
    type Error = DisplayError;

    fn clear(&mut self) -> Result<(), Self::Error> {
        DrawTarget::clear(&mut self.display, BinaryColor::Off)
    }

    fn draw_rect_outline(&mut self, x: u16, y: u16, width: u16, height: u16) -> Result<(), Self::Error> {
        // Inside alignment keeps a full-panel outline on the panel
        let style = PrimitiveStyleBuilder::new()
            .stroke_color(BinaryColor::On)
            .stroke_width(1)
            .stroke_alignment(StrokeAlignment::Inside)
            .build();
        Self::rect(x, y, width, height).into_styled(style).draw(&mut self.display)
    }

    fn draw_filled_rect(&mut self, x: u16, y: u16, width: u16, height: u16) -> Result<(), Self::Error> {
        Self::rect(x, y, width, height)
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut self.display)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.display.flush()
    }
}
