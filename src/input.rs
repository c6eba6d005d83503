use crossterm::event::KeyCode;

/// Normalized navigation signal. Produced here, consumed once by the feed
/// controller, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Advance,
    Retreat,
    ToggleInteraction,
}

/// Folds wheel ticks and drag gestures into at most one intent per gesture.
/// The wheel buffer persists across sub-threshold events and only resets
/// when it fires; there is no time-based decay. Suppression (during a
/// transition or while a modal is open) is the caller's job: suppressed raw
/// events are simply never fed in, so they neither fire nor accumulate.
pub struct Aggregator {
    wheel_buffer: f32,
    wheel_threshold: f32,
    drag_origin: Option<u16>,
    swipe_threshold: u16,
}

impl Aggregator {
    pub fn new(wheel_threshold: f32, swipe_threshold: u16) -> Self {
        Self {
            wheel_buffer: 0.0,
            wheel_threshold,
            drag_origin: None,
            swipe_threshold,
        }
    }

    /// Accumulates a signed wheel delta. Positive deltas (scrolling down)
    /// advance the feed.
    pub fn wheel(&mut self, delta: f32) -> Option<Intent> {
        self.wheel_buffer += delta;
        if self.wheel_buffer > self.wheel_threshold {
            self.wheel_buffer = 0.0;
            Some(Intent::Advance)
        } else if self.wheel_buffer < -self.wheel_threshold {
            self.wheel_buffer = 0.0;
            Some(Intent::Retreat)
        } else {
            None
        }
    }

    pub fn drag_start(&mut self, row: u16) {
        self.drag_origin = Some(row);
    }

    /// Ends a drag. A vertical move beyond the threshold is a swipe; less
    /// than that counts as a tap and toggles playback.
    pub fn drag_end(&mut self, row: u16) -> Option<Intent> {
        let origin = self.drag_origin.take()?;
        let delta = i32::from(origin) - i32::from(row);
        if delta.unsigned_abs() as u16 > self.swipe_threshold {
            if delta > 0 {
                Some(Intent::Advance)
            } else {
                Some(Intent::Retreat)
            }
        } else {
            Some(Intent::ToggleInteraction)
        }
    }

    /// Drops any half-finished gesture and the accumulated wheel buffer,
    /// e.g. when a modal opens mid-gesture.
    pub fn reset(&mut self) {
        self.wheel_buffer = 0.0;
        self.drag_origin = None;
    }

    pub fn wheel_buffer(&self) -> f32 {
        self.wheel_buffer
    }
}

pub fn key_intent(code: KeyCode) -> Option<Intent> {
    match code {
        KeyCode::Down | KeyCode::PageDown | KeyCode::Char('j') => Some(Intent::Advance),
        KeyCode::Up | KeyCode::PageUp | KeyCode::Char('k') => Some(Intent::Retreat),
        KeyCode::Char(' ') | KeyCode::Enter => Some(Intent::ToggleInteraction),
        _ => None,
    }
}
