pub mod clock;
pub mod coordinator;
pub mod token;
pub mod window;

pub use coordinator::{CheckInCoordinator, CheckInError};
pub use token::TokenService;
pub use window::{WindowConfig, WindowState};
