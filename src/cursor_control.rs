//! Pointer injection for X11-based systems.
//!
//! Moves the pointer with `WarpPointer` and synthesizes button presses through the
//! XTEST extension. Wheel scrolling on X11 is buttons 4-7, one press per notch.

use crate::{
    constants::SCROLL_STEP_UNITS_PER_NOTCH,
    input_sink::InputSink,
    Error, Result,
};
use log::{debug, info};
use x11rb::{
    connection::{Connection, RequestConnection},
    protocol::{
        xproto::{ConnectionExt as _, Screen, BUTTON_PRESS_EVENT, BUTTON_RELEASE_EVENT},
        xtest::{self, ConnectionExt as _},
    },
    rust_connection::RustConnection,
    CURRENT_TIME,
};

const BUTTON_LEFT: u8 = 1;
const BUTTON_RIGHT: u8 = 3;
const WHEEL_UP: u8 = 4;
const WHEEL_DOWN: u8 = 5;
const WHEEL_LEFT: u8 = 6;
const WHEEL_RIGHT: u8 = 7;

/// Input sink backed by an X11 connection
pub struct X11InputSink {
    connection: RustConnection,
    screen: Screen,
    screen_width: u16,
    screen_height: u16,
}

impl X11InputSink {
    /// Connect to the default display and check for XTEST
    ///
    /// # Errors
    ///
    /// Returns `X11` if the display is unreachable or lacks the XTEST extension
    pub fn new() -> Result<Self> {
        info!("Initializing X11 input sink");

        let (connection, screen_num) = RustConnection::connect(None)
            .map_err(|e| Error::X11(format!("Failed to connect to X11: {e}")))?;

        let screen = connection
            .setup()
            .roots
            .get(screen_num)
            .ok_or_else(|| Error::X11("Failed to get screen".to_string()))?
            .clone();

        let has_xtest = connection
            .extension_information(xtest::X11_EXTENSION_NAME)
            .map_err(|e| Error::X11(format!("Failed to query extensions: {e}")))?
            .is_some();
        if !has_xtest {
            return Err(Error::X11("XTEST extension not available".to_string()));
        }

        let screen_width = screen.width_in_pixels;
        let screen_height = screen.height_in_pixels;
        info!("Connected to X11 display, screen: {}x{}", screen_width, screen_height);

        Ok(Self {
            connection,
            screen,
            screen_width,
            screen_height,
        })
    }

    fn fake_button(&self, event_type: u8, button: u8) -> Result<()> {
        self.connection
            .xtest_fake_input(event_type, button, CURRENT_TIME, self.screen.root, 0, 0, 0)
            .map_err(|e| Error::InputSink(format!("Failed to send fake input: {e}")))?;
        Ok(())
    }

    fn press(&self, button: u8, times: u32) -> Result<()> {
        for _ in 0..times {
            self.fake_button(BUTTON_PRESS_EVENT, button)?;
            self.fake_button(BUTTON_RELEASE_EVENT, button)?;
        }
        self.flush()
    }

    fn flush(&self) -> Result<()> {
        self.connection
            .flush()
            .map_err(|e| Error::InputSink(format!("Failed to flush connection: {e}")))
    }

    fn scroll(&self, steps: i32, positive: u8, negative: u8) -> Result<()> {
        if steps == 0 {
            return Ok(());
        }
        let button = if steps > 0 { positive } else { negative };
        debug!("Scrolling {steps} (button {button})");
        self.press(button, wheel_notches(steps))
    }
}

/// Wheel presses for a scroll magnitude; never zero for a non-zero scroll
#[must_use]
pub fn wheel_notches(steps: i32) -> u32 {
    (steps.unsigned_abs() / SCROLL_STEP_UNITS_PER_NOTCH.unsigned_abs()).max(1)
}

impl InputSink for X11InputSink {
    fn screen_size(&self) -> (u32, u32) {
        (u32::from(self.screen_width), u32::from(self.screen_height))
    }

    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        // Clamp to screen bounds safely
        let max_x = i32::from(self.screen_width.saturating_sub(1)).min(i32::from(i16::MAX));
        let max_y = i32::from(self.screen_height.saturating_sub(1)).min(i32::from(i16::MAX));
        let x = i16::try_from(x.clamp(0, max_x)).unwrap_or(i16::MAX);
        let y = i16::try_from(y.clamp(0, max_y)).unwrap_or(i16::MAX);

        self.connection
            .warp_pointer(x11rb::NONE, self.screen.root, 0, 0, 0, 0, x, y)
            .map_err(|e| Error::InputSink(format!("Failed to warp pointer: {e}")))?;
        self.flush()
    }

    fn click(&mut self) -> Result<()> {
        debug!("Left click");
        self.press(BUTTON_LEFT, 1)
    }

    fn double_click(&mut self) -> Result<()> {
        debug!("Double click");
        self.press(BUTTON_LEFT, 2)
    }

    fn right_click(&mut self) -> Result<()> {
        debug!("Right click");
        self.press(BUTTON_RIGHT, 1)
    }

    fn scroll_vertical(&mut self, steps: i32) -> Result<()> {
        self.scroll(steps, WHEEL_UP, WHEEL_DOWN)
    }

    fn scroll_horizontal(&mut self, steps: i32) -> Result<()> {
        self.scroll(steps, WHEEL_RIGHT, WHEEL_LEFT)
    }
}
