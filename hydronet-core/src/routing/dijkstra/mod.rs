mod shortest_path;
mod state;

pub use shortest_path::{path_length, shortest_path, shortest_path_lengths};
