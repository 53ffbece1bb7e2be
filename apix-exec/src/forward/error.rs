use apix_proxy::ProxyError;

/// Failures of one forward node or of the chain as a whole. `Clone` so a
/// cached node failure reaches every dependent unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForwardError {
    #[error("forward '{node}' depends on unknown forward '{dep}'")]
    UnknownDependency { node: String, dep: String },
    #[error("cyclic dependency through forward '{node}'")]
    CyclicDependency { node: String },
    #[error("forward '{node}' declares no target")]
    MissingTarget { node: String },
    #[error("forward '{node}': invalid source expression for '{field}': {message}")]
    InvalidSourceExpression {
        node: String,
        field: String,
        message: String,
    },
    #[error("forward '{node}': invalid test: {message}")]
    InvalidPredicate { node: String, message: String },
    #[error("forward '{node}': unresolved source reference '{reference}'")]
    UnresolvedSourceReference { node: String, reference: String },
    #[error("forward '{node}' failed its result test")]
    PredicateEvaluationFailure { node: String },
    #[error("forward '{node}': {source}")]
    Transport {
        node: String,
        #[source]
        source: ProxyError,
    },
    #[error("forward '{node}': http {status}")]
    HttpStatus { node: String, status: u16 },
    #[error("forward '{node}': http request failed: {message}")]
    Http { node: String, message: String },
    #[error("forward '{node}': cannot encode parameters: {message}")]
    Encode { node: String, message: String },
}

impl ForwardError {
    /// Name of the node the error is attributed to.
    pub fn node(&self) -> &str {
        match self {
            Self::UnknownDependency { node, .. }
            | Self::CyclicDependency { node }
            | Self::MissingTarget { node }
            | Self::InvalidSourceExpression { node, .. }
            | Self::InvalidPredicate { node, .. }
            | Self::UnresolvedSourceReference { node, .. }
            | Self::PredicateEvaluationFailure { node }
            | Self::Transport { node, .. }
            | Self::HttpStatus { node, .. }
            | Self::Http { node, .. }
            | Self::Encode { node, .. } => node,
        }
    }
}
