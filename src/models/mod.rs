pub mod courier;
pub mod dispatch_log;
pub mod order;
pub mod tags;
