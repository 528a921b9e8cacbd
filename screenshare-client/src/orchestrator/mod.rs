mod candidate_buffer;
mod link_event;
mod link_state;
mod orchestrator;
mod peer_link;

pub use candidate_buffer::*;
pub use link_event::*;
pub use link_state::*;
pub use orchestrator::*;
pub use peer_link::LinkHandle;
