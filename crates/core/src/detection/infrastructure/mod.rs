pub mod cascade_model;
pub mod haar_cascade_detector;
pub mod integral;
pub mod model_resolver;
