use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PagerError {
    #[error("page controller is not attached to a page view")]
    NotAttached,

    #[error("page view has not been laid out yet")]
    NotLaidOut,
}
