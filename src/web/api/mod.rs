pub mod catalog;
pub mod error;
pub mod radio;
pub mod tracker;
