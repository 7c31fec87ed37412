//! Instrumentation output readers.

pub mod cov;
pub mod malloc;

pub use cov::{
    clean_file, clean_folder, find_count_files, process_file, process_folder, read_count_file,
    ProcessConfig, COUNT_FIELD_WIDTH,
};
pub use malloc::{analyze_malloc, analyze_malloc_files, find_malloc_files, MallocInfo};
