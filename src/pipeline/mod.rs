pub mod coefficients;
pub mod dashboard;
pub mod estimate;
pub mod optimize;
pub mod recommend;
pub mod validate;
