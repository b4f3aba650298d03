pub mod dispatch;
pub mod health;
pub mod order;
pub mod robots;
pub mod ws;
