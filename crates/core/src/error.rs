use thiserror::Error;

use crate::model::{LocaleError, QuizError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Locale(#[from] LocaleError),
}
