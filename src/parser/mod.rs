pub mod command;
pub mod tokenizer;

pub use command::{Command, Projection};
pub use tokenizer::{Token, tokenize, tokenize_marked};
