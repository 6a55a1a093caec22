use thiserror::Error;

use techshop_core::render::RenderError;
use techshop_db::RepositoryError;

pub const STORE_FAILURE_MESSAGE: &str =
    "Xin lỗi, hệ thống đang gặp sự cố khi tra cứu dữ liệu. Vui lòng thử lại sau.";

/// Failures that end an action early. The registry logs them and answers
/// with [`ActionError::user_message`]; the turn itself still succeeds.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl ActionError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Repository(_) | Self::Render(_) => STORE_FAILURE_MESSAGE,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Repository(_) => "repository",
            Self::Render(_) => "render",
        }
    }
}
