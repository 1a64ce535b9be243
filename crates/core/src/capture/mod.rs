pub mod capture_photo_use_case;
pub mod chosen_file_check;
pub mod domain;
pub mod infrastructure;
pub mod live_capturer;
pub mod live_preview;
pub mod overlay;
pub mod still_capturer;
