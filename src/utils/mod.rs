pub mod time;

pub use time::{bar_datetime, date_range, epoch_range};
