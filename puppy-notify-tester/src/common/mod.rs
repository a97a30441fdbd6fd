pub mod util;

pub use util::{parse_date_arg, split_csv};
