//! Equalizer Error Types

use std::io;

use thiserror::Error;

/// Errors that can occur in the equalizer facade
#[derive(Error, Debug)]
pub enum EqError {
    #[error("Equalizer not configured - call begin() with a valid audio format first")]
    NotConfigured,

    #[error("Audio format error: {0}")]
    ConfigError(String),

    #[error("Unsupported sample format: {bits} bits per sample, this equalizer processes {expected}")]
    UnsupportedSampleFormat { bits: u16, expected: u16 },

    #[error("Processor filtered {processed} of {expected} bytes")]
    IncompleteProcessing { processed: usize, expected: usize },

    #[error("DSP error: {0}")]
    DspError(#[from] fireq_dsp::DspError),
}

/// Result type alias for equalizer operations
pub type EqResult<T> = Result<T, EqError>;

impl From<EqError> for io::Error {
    fn from(err: EqError) -> Self {
        io::Error::new(io::ErrorKind::Other, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EqError::NotConfigured;
        assert!(err.to_string().contains("begin()"));

        let err = EqError::UnsupportedSampleFormat {
            bits: 8,
            expected: 16,
        };
        assert!(err.to_string().contains("8 bits"));

        let err = EqError::IncompleteProcessing {
            processed: 0,
            expected: 1026,
        };
        assert!(err.to_string().contains("0 of 1026"));
    }

    #[test]
    fn test_error_from_dsp() {
        let dsp_err = fireq_dsp::DspError::InvalidBandIndex { index: 12, bands: 12 };
        let eq_err: EqError = dsp_err.into();
        assert!(matches!(eq_err, EqError::DspError(_)));
    }

    #[test]
    fn test_into_io_error() {
        let io_err: io::Error = EqError::NotConfigured.into();
        assert_eq!(io_err.kind(), io::ErrorKind::Other);
    }
}
