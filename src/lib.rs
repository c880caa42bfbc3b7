pub mod config;
pub mod debounce;
pub mod error;
pub mod filter;
pub mod live;
pub mod logging;
pub mod output;
pub mod query;
pub mod records;

pub use config::{OutputFormat, Settings};
pub use debounce::{DEFAULT_DELAY, Debounced};
pub use error::{Error, Result};
pub use filter::{SearchFilter, filter_indices, filter_items};
pub use live::LiveFilter;
pub use query::{FieldPath, Needle, SearchKey, Searchable};
pub use records::{load_records, parse_records};
