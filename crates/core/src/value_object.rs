//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and are immutable: a loan window or a
/// requester snapshot is defined entirely by its fields. To "modify" one,
/// build a new one.
///
/// ```ignore
/// let a = LoanWindow::new(apr_1, apr_8)?;
/// let b = LoanWindow::new(apr_1, apr_8)?;
/// assert_eq!(a, b);
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
