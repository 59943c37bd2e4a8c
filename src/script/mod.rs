//! The conversation script: ordered step table plus per-step validators.

pub mod steps;
pub mod validators;

pub use steps::{Script, Step};
pub use validators::{Answer, EmailCapture, Rejected, TextField, Validator, YesNoField};
