mod membership_registry;
mod participant;
mod room;
mod room_command;
mod room_manager;

pub use membership_registry::*;
pub use participant::*;
pub use room::*;
pub use room_command::*;
pub use room_manager::*;
