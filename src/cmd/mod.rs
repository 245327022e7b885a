mod analyze;
mod extract;
mod prompt;

pub use analyze::cmd_analyze;
pub use extract::cmd_extract;
pub use prompt::cmd_prompt;
