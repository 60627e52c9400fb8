//! Debug renderings of graphs and compiled scripts.
pub mod dot;
pub mod listing;

pub use dot::to_dot;
pub use listing::format_script;
