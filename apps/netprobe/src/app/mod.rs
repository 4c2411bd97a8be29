//! The screen controller and its view contract.
//!
//! The controller wires probes, the active-state store, the runner and the
//! network info together and drives them from the UI's start/stop trigger
//! and pause/resume lifecycle. The UI itself sits behind [`RunView`].

pub mod controller;
pub mod view;

pub use controller::Controller;
pub use view::RunView;
