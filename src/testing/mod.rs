//! Testing infrastructure for clickguard.
//!
//! Lets the controller run end to end without a real desktop:
//! - **Mocks**: [`MockDesktop`], a scriptable screen implementing both
//!   [`UiDriver`](crate::driver::UiDriver) and
//!   [`StateProbe`](crate::driver::StateProbe)
//! - **Assertions**: checks for interaction results
//!
//! # Example
//!
//! ```rust,ignore
//! use clickguard::testing::{assert_completed_with, MockDesktop, TargetBehavior};
//!
//! let desktop = MockDesktop::new()
//!     .with_target(TargetBehavior::new(Location::new(100, 100), [Strategy::ElementSearch]));
//! let mut controller = Controller::new(desktop.clone(), desktop, GuardConfig::default())?;
//! let result = controller.submit(InteractionRequest::click((100, 100)));
//! assert_completed_with(&result, Strategy::ElementSearch);
//! ```

pub mod assertions;
pub mod mocks;

pub use assertions::*;
pub use mocks::*;
