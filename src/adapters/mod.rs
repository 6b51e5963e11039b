pub mod status_command;
pub mod telegram;
pub mod traits;

pub use status_command::{locate_program, CommandStatusSource};
pub use telegram::{LogTransport, TelegramNotifier};
pub use traits::{Clock, StatusSource, SystemClock, Transport};

#[cfg(test)]
pub use traits::MockTransport;
