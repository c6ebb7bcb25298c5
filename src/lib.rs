pub mod logger;
pub mod roi_pipeline;
