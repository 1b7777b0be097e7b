pub mod health;
pub mod key;
pub mod serve;
pub mod users;
