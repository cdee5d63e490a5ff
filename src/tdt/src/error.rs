use thiserror::Error;

#[derive(Debug, Error)]
pub enum TdtError {
    #[error("The {role} thread panicked")]
    ThreadPanicked { role: &'static str },
}
