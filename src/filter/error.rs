use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid id '{token}' in '{param}': expected a comma-separated list of integers")]
    InvalidIdList { param: String, token: String },

    #[error("Invalid value '{value}' for '{param}': expected 0 or 1")]
    InvalidFlag { param: String, value: String },
}
