//! CLI domain: parse, route, output and presentation only.
//! No protocol logic lives here; commands dispatch to the symlink service.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{format_document_raw, format_symlink_list};
pub use route::RunContext;
