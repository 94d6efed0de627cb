//! Row-by-row parsing with structural error classification.

mod reader;
mod rows;
mod tokenizer;

pub use reader::{CRLF, DecodeFailure, LineReader};
pub use rows::{ParseOutcome, Row, RowParser, classify_failure};
pub use tokenizer::{RowTokenizer, TokenizeError, Tokenized};
