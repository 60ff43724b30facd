pub mod driver;
pub mod event;
pub mod observer;
pub mod server;
pub mod state;

pub use driver::SchedCore;
pub use event::{EventKey, Resumption, SimEvent, TraceRecord, Wake};
pub use observer::Observer;
pub use server::{Server, ServerState, ServerStats};
pub use state::{Clock, ProcessId, SimTime, Wait, WaitId, WaitState};
