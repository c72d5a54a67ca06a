pub mod common;

mod chained_refresh_and_retry;
mod retry_timing;
