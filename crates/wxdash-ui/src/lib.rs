//! Dashboard UI for wxdash
//!
//! The page is an element tree rendered from the saved locations and the
//! view state; a [`Controller`] turns events on it into state changes and
//! background jobs, and the [`terminal`] module drives it from stdin.

pub mod controller;
pub mod dom;
pub mod strings;
pub mod tasks;
pub mod terminal;
pub mod view;

pub use controller::{Action, Controller, Input, Services, Settings, TaskEvent};
pub use dom::{Event, EventKind, Node};
pub use tasks::{Debouncer, TaskSlot};
pub use view::{render_page, ViewState};
