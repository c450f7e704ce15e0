//! Small helpers shared by the UI and startup code.
//!
//! - **Text**: width-aware truncation and terminal sanitizing for
//!   server-supplied strings
//! - **Server URL**: parsing the `--server` / `server_url` address

mod text;
mod url;

pub use text::{display_width, file_name, strip_control_chars, truncate_to_width};
pub use url::{validate_server_url, ServerUrlError};
