mod init;
mod macros;
mod run_id;

pub use init::{LogFormat, init_logger};
pub use macros::{child_span, root_span};
pub use run_id::RunId;
