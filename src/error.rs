use crate::parser::ParseError;
use thiserror::Error;

/// Failures surfaced to the embedder. Language-level exceptions stay
/// JavaScript values until they escape a program.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("uncaught exception: {message}")]
    Uncaught { message: String, line: Option<u32> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_render_for_the_host() {
        let parse = EngineError::from(ParseError {
            message: "Unexpected token".into(),
            line: 3,
        });
        assert_eq!(parse.to_string(), "SyntaxError: Unexpected token");
        let uncaught = EngineError::Uncaught {
            message: "TypeError: bad".into(),
            line: Some(1),
        };
        assert_eq!(uncaught.to_string(), "uncaught exception: TypeError: bad");
        let io = EngineError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"));
        assert!(matches!(io, EngineError::Io(_)));
        assert_eq!(io.to_string(), "no such file");
    }
}
