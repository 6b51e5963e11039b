pub mod change;
pub mod platform;
pub mod snapshot;
pub mod state;

pub use change::*;
pub use platform::*;
pub use snapshot::*;
pub use state::*;
