mod capture_source;
mod local_track;
mod media_controller;
mod media_event;

pub use capture_source::*;
pub use local_track::*;
pub use media_controller::*;
pub use media_event::*;
