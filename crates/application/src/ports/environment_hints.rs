//! Environment hints port

/// Supplies raw development-host hints in priority order.
///
/// A hint is any string that may contain a host: a bundle URL, a
/// `host:port` pair, a debugger address. Parsing and filtering happen in
/// the resolver, so providers only report what the platform exposes.
pub trait EnvironmentHints: Send + Sync {
    /// Returns every available hint, best first.
    fn host_candidates(&self) -> Vec<String>;
}

impl EnvironmentHints for Vec<String> {
    fn host_candidates(&self) -> Vec<String> {
        self.clone()
    }
}
