pub mod chart;
pub mod cli;
pub mod fetch;
pub mod git;
pub mod model;
pub mod path;

mod api;

pub use api::{ChartFetch, ChartFetchBuilder};
pub use fetch::{ErrorKind, FetchError, GitGetter};
