pub mod fast_lowercase;
pub mod key;

pub use fast_lowercase::{Needle, fold_case};
pub use key::{FieldPath, SearchKey, Searchable, json_text};
