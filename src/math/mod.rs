pub mod transform;

pub use transform::{orientation_from_row_major, Transform};
