pub mod checksum;
pub mod constants;
pub mod mime;
