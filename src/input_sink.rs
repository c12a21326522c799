//! The seam between gesture logic and OS input injection.
//!
//! Gesture machines only produce [`PointerAction`] values; an [`InputSink`]
//! turns them into real pointer events. Swapping the sink lets the whole engine
//! run without an input backend.

use crate::Result;
use log::info;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One primitive pointer operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    /// Absolute move, screen pixels
    MoveTo { x: i32, y: i32 },
    Click,
    DoubleClick,
    RightClick,
    /// Positive scrolls up
    ScrollVertical(i32),
    /// Positive scrolls right
    ScrollHorizontal(i32),
}

/// Pointer capability used by the engine
pub trait InputSink: Send {
    /// Screen size in pixels, used to map normalized positions
    fn screen_size(&self) -> (u32, u32);

    fn move_to(&mut self, x: i32, y: i32) -> Result<()>;
    fn click(&mut self) -> Result<()>;
    fn double_click(&mut self) -> Result<()>;
    fn right_click(&mut self) -> Result<()>;
    fn scroll_vertical(&mut self, steps: i32) -> Result<()>;
    fn scroll_horizontal(&mut self, steps: i32) -> Result<()>;

    /// Dispatch `action` to the matching primitive
    ///
    /// # Errors
    ///
    /// Propagates the primitive's error
    fn perform(&mut self, action: PointerAction) -> Result<()> {
        match action {
            PointerAction::MoveTo { x, y } => self.move_to(x, y),
            PointerAction::Click => self.click(),
            PointerAction::DoubleClick => self.double_click(),
            PointerAction::RightClick => self.right_click(),
            PointerAction::ScrollVertical(steps) => self.scroll_vertical(steps),
            PointerAction::ScrollHorizontal(steps) => self.scroll_horizontal(steps),
        }
    }
}

impl<S: InputSink + ?Sized> InputSink for Box<S> {
    fn screen_size(&self) -> (u32, u32) {
        (**self).screen_size()
    }
    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        (**self).move_to(x, y)
    }
    fn click(&mut self) -> Result<()> {
        (**self).click()
    }
    fn double_click(&mut self) -> Result<()> {
        (**self).double_click()
    }
    fn right_click(&mut self) -> Result<()> {
        (**self).right_click()
    }
    fn scroll_vertical(&mut self, steps: i32) -> Result<()> {
        (**self).scroll_vertical(steps)
    }
    fn scroll_horizontal(&mut self, steps: i32) -> Result<()> {
        (**self).scroll_horizontal(steps)
    }
}

/// Records every action; clones share the same log.
///
/// Handy in tests: keep one clone, move the other into the controller.
#[derive(Debug, Clone)]
pub struct RecordingSink {
    screen: (u32, u32),
    actions: Arc<Mutex<Vec<PointerAction>>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        Self {
            screen: (screen_width, screen_height),
            actions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn log(&self) -> MutexGuard<'_, Vec<PointerAction>> {
        // A panicking test thread must not hide what was recorded
        self.actions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of all recorded actions
    #[must_use]
    pub fn actions(&self) -> Vec<PointerAction> {
        self.log().clone()
    }

    /// Number of recorded actions matching `pred`
    pub fn count(&self, pred: impl Fn(&PointerAction) -> bool) -> usize {
        self.log().iter().filter(|a| pred(a)).count()
    }

    pub fn clear(&self) {
        self.log().clear();
    }

    fn push(&self, action: PointerAction) -> Result<()> {
        self.log().push(action);
        Ok(())
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

impl InputSink for RecordingSink {
    fn screen_size(&self) -> (u32, u32) {
        self.screen
    }
    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        self.push(PointerAction::MoveTo { x, y })
    }
    fn click(&mut self) -> Result<()> {
        self.push(PointerAction::Click)
    }
    fn double_click(&mut self) -> Result<()> {
        self.push(PointerAction::DoubleClick)
    }
    fn right_click(&mut self) -> Result<()> {
        self.push(PointerAction::RightClick)
    }
    fn scroll_vertical(&mut self, steps: i32) -> Result<()> {
        self.push(PointerAction::ScrollVertical(steps))
    }
    fn scroll_horizontal(&mut self, steps: i32) -> Result<()> {
        self.push(PointerAction::ScrollHorizontal(steps))
    }
}

/// Logs actions instead of performing them (dry runs)
#[derive(Debug, Clone, Copy)]
pub struct LoggingSink {
    screen: (u32, u32),
}

impl LoggingSink {
    #[must_use]
    pub const fn new(screen_width: u32, screen_height: u32) -> Self {
        Self {
            screen: (screen_width, screen_height),
        }
    }
}

impl InputSink for LoggingSink {
    fn screen_size(&self) -> (u32, u32) {
        self.screen
    }
    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        log::debug!("[dry-run] move to ({x}, {y})");
        Ok(())
    }
    fn click(&mut self) -> Result<()> {
        info!("[dry-run] click");
        Ok(())
    }
    fn double_click(&mut self) -> Result<()> {
        info!("[dry-run] double click");
        Ok(())
    }
    fn right_click(&mut self) -> Result<()> {
        info!("[dry-run] right click");
        Ok(())
    }
    fn scroll_vertical(&mut self, steps: i32) -> Result<()> {
        info!("[dry-run] scroll vertical {steps}");
        Ok(())
    }
    fn scroll_horizontal(&mut self, steps: i32) -> Result<()> {
        info!("[dry-run] scroll horizontal {steps}");
        Ok(())
    }
}
