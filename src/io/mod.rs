pub mod case;
pub mod json_writer;
pub mod summary;
pub mod tsv_writer;
