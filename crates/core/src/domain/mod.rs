pub mod document;
pub mod stock;
