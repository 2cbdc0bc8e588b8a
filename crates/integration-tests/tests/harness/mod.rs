pub mod config;
pub mod mock_alist;
pub mod server;
