mod fetcher;
mod requester;

pub use fetcher::*;
pub use requester::*;
