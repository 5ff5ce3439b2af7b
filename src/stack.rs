//! The open-element stack and HTML auto-balancer.
//!
//! The stack stores tag names in one contiguous, append-only byte buffer
//! plus a vector of start offsets — a zero-per-push-allocation scheme.
//! It has to own its own
//! copy of each name rather than borrow from the main [`Buffer`](crate::buffer::Buffer):
//! the main buffer may shift or refill between a push and a much later pop.

use crate::registry;
use crate::text::eq_name;

/// Ordered sequence of open element names, top == innermost, empty at
/// document start and required to be empty at document end.
#[derive(Debug, Default)]
pub struct ElementStack {
    names: Vec<u8>,
    starts: Vec<usize>,
}

impl ElementStack {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.starts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    pub fn push(&mut self, name: &[u8]) {
        self.starts.push(self.names.len());
        self.names.extend_from_slice(name);
    }

    /// Pops the innermost element, returning an owned copy of its name (the
    /// backing buffer is about to be truncated, so nothing can borrow from
    /// it past this call).
    pub fn pop(&mut self) -> Option<Box<[u8]>> {
        let start = self.starts.pop()?;
        let name = self.names[start..].to_vec().into_boxed_slice();
        self.names.truncate(start);
        Some(name)
    }

    pub fn top(&self) -> Option<&[u8]> {
        let start = *self.starts.last()?;
        Some(&self.names[start..])
    }

    /// Index (from the top, 0 == innermost) of the first open element whose
    /// name matches `name`, if any.
    pub fn position_from_top(&self, name: &[u8], case_sensitive: bool) -> Option<usize> {
        for (depth, n) in self.iter_from_top().enumerate() {
            if eq_name(n, name, case_sensitive) {
                return Some(depth);
            }
        }
        None
    }

    /// Iterates open element names innermost-first.
    pub fn iter_from_top(&self) -> impl Iterator<Item = &[u8]> {
        let ends = self
            .starts
            .iter()
            .skip(1)
            .copied()
            .chain(std::iter::once(self.names.len()));
        self.starts
            .iter()
            .copied()
            .zip(ends)
            .rev()
            .map(move |(start, end)| &self.names[start..end])
    }
}

/// Outcome of resolving a close tag `</name>` against the current stack.
pub enum CloseResolution {
    /// `name` matched the stack top directly: emit a real close and pop.
    Matched,
    /// `name` matched an element further down the stack: emit synthetic
    /// auto-closes for everything above it (innermost first), then the real
    /// close, then pop all of them including the match.
    AutoClosedThenMatched { popped_above: usize },
    /// `name` does not appear anywhere on the stack: emit an unmatched-close
    /// pair and leave the stack untouched.
    Unmatched,
}

/// Resolves how a close tag should be handled without mutating the stack —
/// callers apply the resulting pops themselves once they've reported the
/// corresponding events, keeping event emission and state mutation
/// independent and easy to reason about.
pub fn resolve_close(stack: &ElementStack, name: &[u8], case_sensitive: bool) -> CloseResolution {
    match stack.position_from_top(name, case_sensitive) {
        Some(0) => CloseResolution::Matched,
        Some(depth) => CloseResolution::AutoClosedThenMatched {
            popped_above: depth,
        },
        None => CloseResolution::Unmatched,
    }
}

/// Applies the fixed-point implicit-close rule:
/// while the stack top triggers an optional-close rule against `incoming`,
/// pop it. Returns the popped names in pop order; callers emit the
/// corresponding `autoCloseStart`/`autoCloseEnd` events for each, in order,
/// before the real `openStart`.
pub fn implicit_closes_for_open(stack: &mut ElementStack, incoming: &[u8]) -> Vec<Box<[u8]>> {
    let mut popped = Vec::new();
    loop {
        match stack.top() {
            Some(top) if registry::implicitly_closes(incoming, top) => {
                popped.push(stack.pop().expect("top() returned Some"));
            }
            _ => break,
        }
    }
    popped
}
