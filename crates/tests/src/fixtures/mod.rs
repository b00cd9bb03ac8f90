pub mod memory;
pub mod test_app;
