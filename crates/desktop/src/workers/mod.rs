pub mod jobs;
pub mod model_cache;
