pub mod reading_ext;
