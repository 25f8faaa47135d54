use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("domain validation failed: {message}")]
    Validation { message: String },
    #[error("invalid frontmatter in `{file}`: {message}")]
    Frontmatter { file: String, message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn frontmatter(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Frontmatter {
            file: file.into(),
            message: message.into(),
        }
    }
}
