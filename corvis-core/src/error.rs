/// Top-level corvis error type.
///
/// All fallible operations in `corvis-core` return [`Result<T, CorvisError>`](Result).
/// Each variant wraps a domain-specific error enum, allowing callers to
/// match on the error source without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum CorvisError {
    /// Error running the external annotation tool.
    #[error("Annotation error: {0}")]
    Annotate(#[from] AnnotateError),

    /// Error reading or interpreting input documents.
    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),

    /// Error during coreference error extraction.
    #[error("Analysis error: {0}")]
    Analyze(#[from] AnalyzeError),

    /// Error during visualization output.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Error from the entity graph engine.
    #[error("Graph engine error: {0}")]
    Graph(#[from] corvis_graphs::GraphError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from running the annotation tool.
#[derive(thiserror::Error, Debug)]
pub enum AnnotateError {
    /// The tool location does not point at an installation directory.
    #[error("Annotation tool not found at {0}")]
    ToolNotFound(String),

    /// The tool process exited unsuccessfully.
    #[error("Annotation tool failed on {document} ({status}): {stderr}")]
    Process {
        /// Name of the document being annotated.
        document: String,
        /// Exit status description.
        status: String,
        /// Tail of the tool's standard error.
        stderr: String,
    },

    /// The tool did not finish within the configured timeout.
    #[error("Annotation of {document} timed out after {seconds}s")]
    Timeout {
        /// Name of the document being annotated.
        document: String,
        /// Configured timeout.
        seconds: u64,
    },

    /// The tool's output could not be interpreted.
    #[error("Unreadable annotation output for {document}: {message}")]
    Output {
        /// Name of the document being annotated.
        document: String,
        /// Description of the problem.
        message: String,
    },

    /// Filesystem or process I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors while loading input documents.
#[derive(thiserror::Error, Debug)]
pub enum CorpusError {
    /// An input file could not be read.
    #[error("Cannot read {path}: {source}")]
    Read {
        /// Path of the input file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A CoNLL file has broken structure.
    #[error("Malformed input at line {line}: {message}")]
    Malformed {
        /// One-based line number.
        line: usize,
        /// Description of the problem.
        message: String,
    },
}

/// Errors during error extraction.
#[derive(thiserror::Error, Debug)]
pub enum AnalyzeError {
    /// A system document has no reference document with the same identifier.
    #[error("System document {0} has no reference counterpart")]
    UnalignedDocument(String),

    /// A corpus holds two documents with the same identifier.
    #[error("Document {0} appears more than once")]
    DuplicateDocument(String),

    /// A strategy was supplied for the wrong role.
    #[error("{algorithm} cannot be used as the {role} strategy")]
    WrongRole {
        /// Algorithm name.
        algorithm: String,
        /// Expected role ("recall" or "precision").
        role: &'static str,
    },
}

/// Errors during visualization output.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// No analysis was recorded under the requested label.
    #[error("No decisions recorded for corpus {0}")]
    UnknownCorpus(String),

    /// An output format name is not known.
    #[error("Unknown output format: {0}")]
    UnknownFormat(String),

    /// Output serialization failed.
    #[error("Template error: {0}")]
    Template(String),

    /// Filesystem I/O error writing rendered output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors in corvis configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience alias for `Result<T, CorvisError>`.
pub type Result<T> = std::result::Result<T, CorvisError>;
