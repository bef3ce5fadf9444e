// List the different tasks here
pub mod experiments;
