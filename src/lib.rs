#![allow(clippy::too_many_arguments)]

#[macro_use]
pub mod logger;
pub mod cli;
pub mod editor;
pub mod error;
pub mod history;
pub mod io;
pub mod ops;
pub mod pipeline;
pub mod session;
pub mod view;

pub use editor::Editor;
pub use error::EditorError;
pub use history::OperationLog;
pub use ops::{EditOp, FlipAxis, Watermark, WatermarkSource};
pub use pipeline::Pipeline;
pub use session::SessionStore;
pub use view::ViewState;
