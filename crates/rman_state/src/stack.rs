//! State records and the stacks that scope them.
//!
//! A [`StateStack`] always holds at least one base frame. `push` deep-copies
//! the top, `pop` discards it; popping the base frame is reported as a
//! `Nesting` error and leaves the stack untouched.

use std::any::Any;
use std::fmt;

use rman_core::{ErrorCode, Result, RiError};

/// The kinds of graphics-state records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Options,
    Attributes,
    Transform,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Options => "options",
            Self::Attributes => "attributes",
            Self::Transform => "transform",
        })
    }
}

/// Common capabilities of the graphics-state records.
pub trait StateRecord: fmt::Debug {
    fn kind(&self) -> StateKind;

    /// Deep copy behind a trait object.
    fn duplicate(&self) -> Box<dyn StateRecord>;

    fn as_any(&self) -> &dyn Any;

    /// Deep-copies `source` into `self`.
    ///
    /// Fails with `Consistency` if `source` is a different kind of record.
    fn assign(&mut self, source: &dyn StateRecord) -> Result<()>;
}

/// Implements [`StateRecord`] for a `Clone` state type.
macro_rules! impl_state_record {
    ($ty:ty, $kind:ident) => {
        impl $crate::stack::StateRecord for $ty {
            fn kind(&self) -> $crate::stack::StateKind {
                $crate::stack::StateKind::$kind
            }

            fn duplicate(&self) -> Box<dyn $crate::stack::StateRecord> {
                Box::new(self.clone())
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }

            fn assign(&mut self, source: &dyn $crate::stack::StateRecord) -> rman_core::Result<()> {
                match source.as_any().downcast_ref::<$ty>() {
                    Some(src) => {
                        self.clone_from(src);
                        Ok(())
                    }
                    None => Err($crate::stack::kind_mismatch(
                        $crate::stack::StateKind::$kind,
                        source.kind(),
                    )),
                }
            }
        }
    };
}

pub(crate) use impl_state_record;

pub(crate) fn kind_mismatch(expected: StateKind, got: StateKind) -> RiError {
    RiError::error(
        ErrorCode::Consistency,
        format!("cannot assign {got} state to {expected} state"),
    )
}

/// A stack of state records with a permanent base frame.
#[derive(Debug, Clone)]
pub struct StateStack<T> {
    frames: Vec<T>,
}

impl<T: Clone> StateStack<T> {
    #[must_use]
    pub fn new(base: T) -> Self {
        Self { frames: vec![base] }
    }

    /// Current (innermost) frame.
    #[inline]
    #[must_use]
    pub fn top(&self) -> &T {
        // The base frame is never popped.
        &self.frames[self.frames.len() - 1]
    }

    #[inline]
    pub fn top_mut(&mut self) -> &mut T {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Pushes a deep copy of the current top.
    pub fn push(&mut self) {
        let copy = self.top().clone();
        self.frames.push(copy);
    }

    /// Discards the top frame and restores the previous one.
    pub fn pop(&mut self) -> Result<()> {
        if self.frames.len() <= 1 {
            return Err(RiError::error(ErrorCode::Nesting, "state stack underflow"));
        }
        self.frames.pop();
        Ok(())
    }

    /// Number of frames, including the base frame.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Drops every frame above the base.
    pub fn unwind(&mut self) {
        self.frames.truncate(1);
    }
}

impl<T: Clone + Default> Default for StateStack<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
