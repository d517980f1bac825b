//! Dashboard surface: pure renderer, interaction controller and the
//! terminal front end.

pub mod commands;
pub mod controller;
pub mod error_mapping;
pub mod render;
pub mod terminal;

pub use commands::{dispatch, Command, CommandError};
pub use controller::{
    ClearSavedOutcome, Confirm, ControllerSettings, DashboardController, DashboardView,
    Notification, NotificationKind, ResolutionOutcome, ResolutionState, Section, Trigger,
};
pub use error_mapping::IntoAppError;
pub use render::ForecastMode;
pub use terminal::{TerminalConfirm, TerminalView};
