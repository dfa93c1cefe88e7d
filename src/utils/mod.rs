pub mod error;
pub mod expect_msg;
