pub mod processor;
pub mod registry;

pub use processor::{AfterEach, FnHandle, Handle, HandlerList, Processor, stop_on_error};
pub use registry::{Handlers, Stage};
