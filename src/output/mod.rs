// Output module - Output formatting (JSON, Terminal)

pub mod json;
pub mod terminal;

pub use json::{generate_json, write_json_file};
pub use terminal::{display_results, render_results};
