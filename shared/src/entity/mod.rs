pub mod sessions;
pub mod strategies;
pub mod trades;
pub mod users;
