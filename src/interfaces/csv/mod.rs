pub mod client_reader;
pub mod client_writer;
pub mod transfer_reader;
