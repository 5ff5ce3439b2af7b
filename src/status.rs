//! The handler-writable back-channel.
//!
//! `ParseStatus` is the mutable context the design notes call out as an
//! alternative to a per-event return directive: a small struct passed by
//! `&mut` reference that the handler may poke between callbacks to steer the
//! next round of tokenization, without the parser having to reparse anything.

/// Back-channel flags a [`crate::handler::MarkupHandler`] may set to
/// influence the next iteration of the parse loop.
#[derive(Debug, Default)]
pub struct ParseStatus {
    limit_sequence: Option<Box<[u8]>>,
    auto_open_requested: Option<Box<[u8]>>,
    auto_close_requested: bool,
    avoid_stacking_open_element: bool,
}

impl ParseStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables structure recognition until `</name>` (`name` matched
    /// case-insensitively, with optional whitespace before the final `>`) is
    /// found. Set automatically by the auto-balancer
    /// when opening a raw-text HTML element; handlers may also set it
    /// directly for custom raw-text dialects. `name` holds just the element
    /// name, not the surrounding `</`/`>` delimiters.
    pub fn set_limit_sequence(&mut self, name: impl Into<Box<[u8]>>) {
        self.limit_sequence = Some(name.into());
    }

    #[inline]
    pub fn limit_sequence(&self) -> Option<&[u8]> {
        self.limit_sequence.as_deref()
    }

    pub fn clear_limit_sequence(&mut self) {
        self.limit_sequence = None;
    }

    /// Requests that the parser synthesize an `autoOpen` for `name` before
    /// the next real event, e.g. so a dialect can require a parent context
    /// like `<tr>` outside `<table>`.
    pub fn request_auto_open(&mut self, name: impl Into<Box<[u8]>>) {
        self.auto_open_requested = Some(name.into());
    }

    pub fn take_auto_open(&mut self) -> Option<Box<[u8]>> {
        self.auto_open_requested.take()
    }

    pub fn request_auto_close(&mut self) {
        self.auto_close_requested = true;
    }

    pub fn take_auto_close_requested(&mut self) -> bool {
        std::mem::replace(&mut self.auto_close_requested, false)
    }

    /// Suppresses pushing the next opened element onto the element stack.
    pub fn suppress_stacking(&mut self) {
        self.avoid_stacking_open_element = true;
    }

    pub fn take_avoid_stacking(&mut self) -> bool {
        std::mem::replace(&mut self.avoid_stacking_open_element, false)
    }
}
