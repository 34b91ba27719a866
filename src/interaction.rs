//! Pointer-driven gestures. At most one runs at a time.

mod drag;
mod foreign_key;
mod resize;

pub use drag::MoveGesture;
pub use foreign_key::{DropOutcome, FieldRef, FkState, default_name, foreign_key_for};
pub use resize::{ResizeGesture, resize_rect};

use crate::scene::ResizeHandle;

/// What part of a table box the pointer went down on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Body,
    Text,
    Handle(ResizeHandle),
}

impl HitTarget {
    /// `body`, `text`, or a handle name such as `se`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "body" => Some(Self::Body),
            "text" => Some(Self::Text),
            other => ResizeHandle::from_str(other).map(Self::Handle),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    Moving(MoveGesture),
    Resizing(ResizeGesture),
    ForeignKey(FkState),
}

impl InteractionMode {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Moving(_) => "moving",
            Self::Resizing(_) => "resizing",
            Self::ForeignKey(FkState::AwaitingSource) => "fk-awaiting-source",
            Self::ForeignKey(FkState::SourceSelected { .. }) => "fk-source-selected",
            Self::ForeignKey(FkState::DialogOpen { .. }) => "fk-dialog",
        }
    }
}
