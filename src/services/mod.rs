pub mod correlator;
pub mod image_host;
pub mod image_pipeline;
pub mod instantdeco;
pub mod poll;
pub mod rate_limit;
pub mod reimagine;
pub mod result_store;
pub mod submitter;
