//! Build optimizer: range filters, scoring and the combination search.

mod filter;
mod search;

pub use filter::{AxisFilter, Direction, FilterInputs, OptimizerFilter};
pub use search::{four_way_product, max_all, search, search_game_data, Candidate, SearchResults};
