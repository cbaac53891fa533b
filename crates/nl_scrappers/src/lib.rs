pub mod news_api;
pub mod scrapers;
mod logging;

pub use logging::init_logging;
pub use news_api::NewsApiClient;
pub use scrapers::HtmlFetcher;

pub mod prelude {
    pub use super::{HtmlFetcher, NewsApiClient};
    pub use nl_core::{ArticleFetcher, Error, NewsLookup, Result};
}
