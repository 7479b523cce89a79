//! Error types and error support code.

/// Error returned by pool operations that can fail.
///
/// Most abnormal conditions a pool encounters (returning a foreign instance, a batch that never
/// completed, a misconfigured initial count) are logged and recovered from in place. The only
/// condition that reaches the caller is running out of instances in a pool that was configured as
/// non-expandable: that is a capacity planning bug and must not be retried.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PoolError {
    /// No idle instances are left in a non-expandable pool.
    #[error("non-expandable pool {pool} is out of pooled instances (template: {template})")]
    Exhausted {
        /// Name of the exhausted pool.
        pool: String,
        /// Name of the template the pool clones its instances from.
        template: String,
    },
}
