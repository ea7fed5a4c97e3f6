//! Input and output formats of the batch binary.

pub mod csv;
