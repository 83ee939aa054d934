//! Structural edits of a network and lookups used while editing.

mod neighbours;
mod split;
