// Library exports for snapfeed-server
// The binary and the integration tests build on these modules

pub mod api;
pub mod config;
pub mod db;
pub mod password;
pub mod seed;
pub mod session;
pub mod state;
