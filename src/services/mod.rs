pub mod composer;
pub mod generation;
pub mod image;
pub mod llm;
pub mod localization;
pub mod prompt;
pub mod repair;
pub mod speech;
pub mod story;
pub mod transport;
