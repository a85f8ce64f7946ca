pub mod check;
pub mod generate;
pub mod initialize;
pub mod unqueued;
