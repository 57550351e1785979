pub mod analysis;
pub mod candle;
pub mod config;
pub mod error;
pub mod watchlist;

pub use analysis::*;
pub use candle::*;
pub use config::*;
pub use error::*;
pub use watchlist::*;
