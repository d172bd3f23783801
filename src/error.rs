/// Result type returned by the kvd library.
pub type Result<T> = std::result::Result<T, KvStoreError>;

/// Error returned by the kvd library.
#[derive(Debug, Fail, PartialEq, Eq)]
pub enum KvStoreError {
    /// The caller supplied an empty key.
    #[fail(display = "empty key not allowed")]
    EmptyKey,

    /// Failure finding key
    #[fail(display = "key not found")]
    KeyNotFound,

    /// A writer panicked while holding the store lock.
    #[fail(display = "store lock poisoned")]
    PoisonedLock,
}
