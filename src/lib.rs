pub mod answer_store;
pub mod config;
pub mod constants;
pub mod controller;
pub mod drag;
pub mod error;
pub mod grading;
pub mod logging;
pub mod play;
pub mod protocol;
pub mod question_source;
pub mod results;
pub mod sentence;
pub mod timer;
pub mod types;
