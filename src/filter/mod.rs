pub mod error;
pub mod params;
pub mod types;

pub use error::FilterError;
pub use params::{parse_flag, parse_id_list};
pub use types::{AttributeFilter, AttributeQuery, RecipeFilter, RecipeQuery};
