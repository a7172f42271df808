//! Error type shared by the entity repository ports.

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by repository adapters.
    ///
    /// Messages carry adapter diagnostics and must never reach a caller
    /// verbatim; domain services translate them into sanitised errors.
    pub enum RepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "repository query failed: {message}",
        /// A uniqueness constraint rejected the write. `field` is the logical
        /// field name, never the constraint name.
        Conflict { field: String } => "unique constraint violated on {field}",
    }
}
