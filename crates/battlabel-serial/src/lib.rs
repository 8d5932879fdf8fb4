pub mod accumulator;
pub mod port;
pub mod reader;
pub mod transport;

pub use accumulator::{decode_chunk, spawn_accumulator, FrameAccumulator, FrameEvent};
pub use port::PortManager;
pub use reader::{ReaderError, ReaderHandle, SerialReader};
pub use transport::{SerialTransport, Transport};
