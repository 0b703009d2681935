//! Longhand: arithmetic the way it is done on paper
//!
//! Given an expression such as `945/5` or `100-99`, Longhand produces the
//! exact result together with a positioned, timed record of every
//! intermediate digit a person would write: carries, borrow chains, partial
//! products, remainders and bracket rules. That record is laid out on a
//! grid, scaled to fit an output surface and revealed step by step.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌────────────┐   ┌───────────┐   ┌─────────┐
//! │ Parser   │──►│ Evaluator │──►│ StepTrace  │──►│ Sequencer │──►│ Surface │
//! │ (core)   │   │ (core)    │   │ (trace)    │   │ + layout  │   │ (render)│
//! └──────────┘   └───────────┘   └────────────┘   └───────────┘   └─────────┘
//!                                                                      │
//!                       ┌──────────┐    ┌───────────────┐              │
//!                       │ Session  │───►│ History/store │◄─────────────┘
//!                       └──────────┘    └───────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use longhand::prelude::*;
//!
//! let evaluator = Evaluator::default();
//! let trace = evaluator.evaluate_str("99+1", DivisionMode::Extended).unwrap();
//! assert_eq!(trace.result(), "100");
//! assert_eq!(trace.events_with_role(Role::Carry).count(), 1);
//! ```

pub mod config;
pub mod core;
pub mod layout;
pub mod render;
pub mod sequencer;
pub mod session;
pub mod store;
pub mod trace;

pub use crate::config::{CalculatorConfig, ConfigError, DivisionMode, SqrtMode};
pub use crate::core::{CalcError, CalcResult, ErrorKind};
pub use crate::session::{Outcome, Session};

/// Common imports for front ends and tests
pub mod prelude {
    pub use crate::config::{
        CalculatorConfig, DivisionMode, ErrorMessages, HistoryConfig, LayoutConfig, SqrtMode,
        TimingConfig,
    };
    pub use crate::core::bignum::BigNumber;
    pub use crate::core::evaluator::Evaluator;
    pub use crate::core::history::{AddOutcome, History, HistoryEntry, HistoryStore};
    pub use crate::core::parser::{BinaryOp, Expression, Operand};
    pub use crate::core::{CalcError, CalcResult, ErrorKind};
    pub use crate::layout::{compute_layout, LayoutMetrics};
    pub use crate::render::{
        extract_result_text, lock, render_text, shared, DisplaySurface, MarkId, MarkKind,
        MemoryDisplay, MemorySurface, OutputSurface, RenderedMark, SharedSurface, SurfaceOp,
    };
    pub use crate::sequencer::{CancellationSource, CancellationToken, Playback, Sequencer};
    pub use crate::session::{Outcome, Session};
    pub use crate::store::{FileStore, KeyValueStore, MemoryStore, StoreError};
    pub use crate::trace::{Cue, Role, StepTrace, VisualEvent};
}
