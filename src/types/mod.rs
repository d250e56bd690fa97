pub mod error;
pub mod extra_data;
pub mod instance;
pub mod key;
pub mod type_info;
