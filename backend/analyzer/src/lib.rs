pub mod analyzer;
pub mod arithmetic;
pub mod cascade;
pub mod literal;
pub mod prompt;

pub use analyzer::Analyzer;
pub use arithmetic::{evaluate, ArithmeticError, Num};
pub use cascade::{parse_reply, Tier};
pub use prompt::build_prompt;
