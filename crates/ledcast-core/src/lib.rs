pub mod config;
pub mod errors;
pub mod frame;

pub use config::{CaptureOptions, Config, OutputOptions};
pub use errors::{CaptureError, DispatchError};
pub use frame::{FrameBuffer, PixelFormat};
