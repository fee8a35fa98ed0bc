//! Reading and writing arrays through a container, plus delimited-text export.
pub mod reader;
pub mod text;
pub mod writer;

pub use reader::{list_datasets, plan_read, read, read_from, read_with, ReadPlan, ReadRequest};
pub use text::write_delimited;
pub use writer::{write, write_into};
