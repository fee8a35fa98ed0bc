//! ndstore: dense N-dimensional `f64` arrays and their container storage.
//!
//! This crate provides the `NdArray` value type (row-major, owned buffer),
//! a full axis-reversal transpose, min/max range scanning, and reading and
//! writing named datasets of a Zarr hierarchy. Reads can extract one index
//! along a chosen dimension, reducing the rank by one, without loading the
//! rest of the dataset.
//!
//! The container backend sits behind the `container::Container` trait so the
//! reader and writer only depend on a small set of storage capabilities.
pub mod array;
pub mod config;
pub mod container;
pub mod error;
pub mod io;

pub use array::{NdArray, ShapeError};
pub use error::{read_strerror, ReadError, READ_ERROR_MESSAGES};
pub use io::reader::{read, ReadRequest};
pub use io::writer::write;
