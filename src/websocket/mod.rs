mod endpoint;
mod handler;
mod message;
mod session;

pub use endpoint::{split_socket, ConnectionError, FrameSink, FrameSource, WsSink, WsSource};
pub use handler::{room_handler, RoomQuery};
pub use message::ChatMessage;
pub use session::{run_session, SessionEnd, SessionSummary};
