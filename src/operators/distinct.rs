//! `distinct`, specialized from the generic [`crate::operators::reduce::Reduce`]
//! machine: group by the whole record (key = record, value = `()`), and emit
//! a single `()` for any group whose total multiplicity is positive.
//!
//! Mirrors `differential_dataflow`'s `threshold`/`distinct` extension
//! methods, which are themselves specializations of its general reduce
//! operator.

/// The reducer passed to `Reduce<T, (), (), _>` to build `distinct`.
///
/// Per the Design Notes, a group whose consolidated count is zero or
/// negative is dropped silently rather than treated as an error: negative
/// accumulations are a normal, transient state of a streaming computation.
pub fn presence_reducer<T>(_key: &T, group: &[((), i64)]) -> Vec<((), i64)> {
    let total: i64 = group.iter().map(|(_, m)| m).sum();
    if total > 0 {
        vec![((), 1)]
    } else {
        Vec::new()
    }
}
