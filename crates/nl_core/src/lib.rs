pub mod error;
pub mod models;
pub mod sources;
pub mod storage;
pub mod text;
pub mod types;

pub use error::{Error, Result};
pub use models::{ChatModel, InferenceModel, SummaryParams};
pub use sources::{ArticleFetcher, NewsLookup};
pub use storage::UserStore;
pub use text::{Tokenizer, WhitespaceTokenizer};
pub use types::*;
