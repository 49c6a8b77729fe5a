//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`EngineError`] covers all failure modes:
//! - invalid-operation errors (state misuse: render-target nesting
//!   violations, camera master/slave violations, out-of-session draws)
//! - resource-creation failures (GPU surface allocation, shader lookup)
//! - render-pass failures, wrapped with the stage that failed
//!
//! None of these errors are retried. A failed pass means the frame simply
//! skips that pass's visual contribution; the caller decides whether that
//! is fatal.
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, EngineError>`.

use thiserror::Error;

/// The main error type for the Ember engine.
#[derive(Error, Debug)]
pub enum EngineError {
    // ========================================================================
    // State-misuse errors
    // ========================================================================
    /// An operation was called in a state that does not permit it.
    ///
    /// Examples: enabling a render target while another is bound, clearing
    /// with nothing bound, reading an unresolved render target, drawing
    /// outside a pass session.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A camera master/slave assignment violated the single-level
    /// hierarchy invariant.
    #[error("Camera hierarchy violation: {0}")]
    CameraHierarchy(String),

    // ========================================================================
    // Resource errors
    // ========================================================================
    /// A GPU resource could not be created.
    #[error("Failed to create {resource}: {cause}")]
    ResourceCreation {
        /// What was being created (e.g. "render target 'GBuffer Depth'")
        resource: String,
        /// Backend-reported cause
        cause: String,
    },

    /// A named shader parameter does not exist in the compiled program.
    #[error("Shader parameter not found: {0}")]
    ParameterNotFound(String),

    // ========================================================================
    // Animation errors
    // ========================================================================
    /// The requested animation clip was never registered.
    #[error("Animation clip not found: {0}")]
    ClipNotFound(String),

    /// A keyframe addresses a bone past the engine-wide palette limit.
    #[error("Bone index {index} exceeds the maximum of {max}")]
    BoneIndexOutOfRange {
        /// The offending bone index
        index: usize,
        /// The engine-wide bone palette capacity
        max: usize,
    },

    /// Clip keyframes were not sorted ascending by time.
    #[error("Keyframes out of order: keyframe {index} has time {time} < {previous}")]
    KeyframesOutOfOrder {
        /// Index of the offending keyframe
        index: usize,
        /// Its timestamp
        time: f32,
        /// The preceding timestamp
        previous: f32,
    },

    // ========================================================================
    // Pass errors
    // ========================================================================
    /// A render pass stage failed. No partial-state recovery is attempted;
    /// the caller is expected to abort the frame's remaining work for this
    /// pass.
    #[error("Render pass stage '{stage}' failed: {source}")]
    PassFailed {
        /// The stage that failed ("begin", "render model", "end")
        stage: &'static str,
        /// The underlying error
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Wraps an error with the pass stage it occurred in.
    #[must_use]
    pub fn in_stage(self, stage: &'static str) -> Self {
        EngineError::PassFailed {
            stage,
            source: Box::new(self),
        }
    }
}

/// Alias for `Result<T, EngineError>`.
pub type Result<T> = std::result::Result<T, EngineError>;
