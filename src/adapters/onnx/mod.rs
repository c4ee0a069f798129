pub mod class_table;
pub mod sign_engine;
