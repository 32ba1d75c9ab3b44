//! Service layer: session lifecycle, edge toggles and composed views

pub mod engagement;
pub mod session;
pub mod views;

pub use engagement::{EngagementService, ToggleOutcome};
pub use session::{SessionService, TokenPair};
pub use views::ViewService;
