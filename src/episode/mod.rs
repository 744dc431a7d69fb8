mod download;
mod filename;

pub use download::{CHUNK_SIZE, download_with_resume};
pub use filename::{MAX_PATH_LEN, PrefixMode, fit_to_path_budget, generate_filename, safe_title};
