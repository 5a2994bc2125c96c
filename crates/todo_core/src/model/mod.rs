pub mod dates;
mod todo;

pub use todo::{Todo, TodoId};
