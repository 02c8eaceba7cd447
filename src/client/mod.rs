//! Client side: local mirror of the room and the presentation loop

pub mod connection;
pub mod mirror;
pub mod presentation;
pub mod surface;

pub use connection::{run, ClientError};
pub use mirror::RoomMirror;
pub use presentation::{InputAction, PresentationLoop};
pub use surface::{Surface, TraceSurface};
