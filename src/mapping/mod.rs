//! Modul für die Umwandlung klassifizierter Eingaben in HID-Ausgaben.
//!
//! Enthält die Betriebsmodi mit ihren Binding-Tabellen, den ModeController
//! (Zustandsautomat über die Modi) und den ActionDispatcher, der aufgelöste
//! Aktionen genau einmal an Transport und Feedback weitergibt.
//!
//! ```text
//! PressEvent / ShakeEvent / Drehgeber
//!        │
//!        ▼
//! ModeController ──(Umschalt-Gesten verschluckt)
//!        │
//!        ▼
//! ActionDispatcher ──► HidTransport / Feedback / LedState
//! ```

pub mod action;
pub mod continuous;
pub mod dispatcher;
pub mod mode;
pub mod mode_controller;

// Re-exports für einfacheren Zugriff
pub use action::{Action, Binding, Trigger};
pub use continuous::{AutoClickSettings, ContinuousOutputs, PointerSettings};
pub use dispatcher::{ActionDispatcher, DispatchStats, Outputs};
pub use mode::{Mode, RotaryRole};
pub use mode_controller::{
    ComboToggle, ControllerState, MenuSettings, ModeChange, ModeChangeCause, ModeController,
    ShakeToggle, ToggleFire, ToggleTarget, TransitionRules,
};
