//! Error types for graph construction.
//!
//! Everything here is raised in the control domain, before any node is
//! scheduled. Sample production in the render domain never fails.

use thiserror::Error;

/// Result type for graph construction and effect playback.
pub type Result<T> = std::result::Result<T, YeepError>;

/// Errors that can occur while building or scheduling an effect.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum YeepError {
    /// Note name missing from the frequency table.
    #[error("unknown note name: {0}")]
    UnknownNote(String),

    /// Oscillator waveform name not recognized.
    #[error("unknown oscillator waveform: {0}")]
    UnknownWaveform(String),

    /// Noise color name not recognized.
    #[error("unknown noise kind: {0}")]
    UnknownNoiseKind(String),

    /// Filter response name not recognized.
    #[error("unknown filter type: {0}")]
    UnknownFilterType(String),

    /// No effect registered under this name.
    #[error("unknown effect: {0}")]
    UnknownEffect(String),

    /// Frequency is non-finite or not positive.
    #[error("invalid frequency: {hz} Hz")]
    InvalidFrequency {
        /// The rejected frequency.
        hz: f32,
    },

    /// A duration is negative or non-finite.
    #[error("invalid duration for {field}: {seconds} seconds")]
    InvalidDuration {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        seconds: f64,
    },

    /// A gain level is outside its accepted range.
    #[error("invalid level for {field}: {level}")]
    InvalidLevel {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        level: f32,
    },

    /// Noise block size must be non-zero.
    #[error("invalid buffer size: {0}")]
    InvalidBufferSize(usize),

    /// Invalid sample rate.
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(f32),

    /// Two effects registered under the same name.
    #[error("effect registered twice: {0}")]
    DuplicateEffect(String),

    /// An effect depends on itself, directly or transitively.
    #[error("cyclic effect delegation: {}", .0.join(" -> "))]
    CyclicEffect(Vec<String>),

    /// An effect body invoked an effect it did not declare.
    #[error("effect {caller} invoked undeclared dependency {callee}")]
    UndeclaredDependency {
        /// Effect doing the invoking.
        caller: String,
        /// Effect it tried to invoke.
        callee: String,
    },

    /// The host refused to allocate another node.
    #[error("render host is out of node capacity ({limit} nodes)")]
    HostCapacity {
        /// Host node limit.
        limit: usize,
    },

    /// A node id does not refer to a live node.
    #[error("unknown node id: {0}")]
    UnknownNode(usize),

    /// The host rejected a connection.
    #[error("invalid connection: {0}")]
    InvalidConnection(String),

    /// The node has no such automatable parameter.
    #[error("node {node} has no {param} parameter")]
    InvalidParam {
        /// Node index.
        node: usize,
        /// Parameter name.
        param: &'static str,
    },
}

impl YeepError {
    /// True for errors caused by bad effect or builder input.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            YeepError::UnknownNote(_)
                | YeepError::UnknownWaveform(_)
                | YeepError::UnknownNoiseKind(_)
                | YeepError::UnknownFilterType(_)
                | YeepError::UnknownEffect(_)
                | YeepError::InvalidFrequency { .. }
        )
    }

    /// True for errors raised by the render host itself.
    pub fn is_host(&self) -> bool {
        matches!(
            self,
            YeepError::HostCapacity { .. }
                | YeepError::UnknownNode(_)
                | YeepError::InvalidConnection(_)
                | YeepError::InvalidParam { .. }
        )
    }
}

/// Reject negative or non-finite durations.
pub(crate) fn check_duration(field: &'static str, seconds: f64) -> Result<()> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(())
    } else {
        Err(YeepError::InvalidDuration { field, seconds })
    }
}

/// Reject levels outside `(0, max]`.
pub(crate) fn check_level(field: &'static str, level: f32, max: f32) -> Result<()> {
    if level.is_finite() && level > 0.0 && level <= max {
        Ok(())
    } else {
        Err(YeepError::InvalidLevel { field, level })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_duration_is_rejected() {
        assert!(check_duration("attack", -0.1).is_err());
        assert!(check_duration("attack", f64::NAN).is_err());
        assert!(check_duration("attack", 0.0).is_ok());
    }

    #[test]
    fn level_range_is_half_open() {
        assert!(check_level("attack_vol", 0.0, 1.0).is_err());
        assert!(check_level("attack_vol", 1.0, 1.0).is_ok());
        assert!(check_level("attack_vol", 1.01, 1.0).is_err());
    }

    #[test]
    fn cycle_message_lists_path() {
        let err = YeepError::CyclicEffect(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(err.to_string(), "cyclic effect delegation: a -> b -> a");
    }

    #[test]
    fn classification() {
        assert!(YeepError::UnknownNote("H9".into()).is_configuration());
        assert!(YeepError::HostCapacity { limit: 4 }.is_host());
        assert!(!YeepError::InvalidBufferSize(0).is_host());
    }
}
