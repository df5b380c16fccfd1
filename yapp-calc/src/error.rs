//! # Calculator Error Type
//!
//! [`CalcError`] covers the failures of the calculator pipeline: malformed
//! numeric literals, symbol-table lookups and arithmetic faults. Arithmetic
//! faults and undefined variables do not stop a run; the driver turns them
//! into a forced syntax error so the offending line is skipped, and the
//! message is recorded in [`Calc::errors`](crate::Calc::errors).
use crate::SymTabError;
use thiserror::Error;

/// Represents all possible errors that can occur within the calculator.
///
/// # Examples
/// ```rust
/// # use yapp_calc::{CalcError, SymTabError};
/// # fn demo(s: &str) -> Result<i64, CalcError> {
/// let n: i64 = s.parse()?; // ParseIntError -> CalcError via #[from]
/// # Ok(n) }
/// let err: CalcError = SymTabError::Undefined { name: "x".into() }.into();
/// assert_eq!(err.to_string(), "undefined variable x");
/// ```
#[derive(Debug, Error)]
pub enum CalcError {
    /// An integer literal could not be parsed from its string representation.
    #[error("unable to parse {0:?}")]
    ParseInt(#[from] std::num::ParseIntError),

    /// A symbol-table operation failed.
    #[error(transparent)]
    SymTab(#[from] SymTabError),

    #[error("division by zero")]
    DivisionByZero,

    /// Result does not fit in an `i64`.
    #[error("integer overflow")]
    Overflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_int_maps_to_calc_error() {
        let res: Result<i64, CalcError> = "99999999999999999999".parse::<i64>().map_err(CalcError::from);
        let err = res.unwrap_err();
        assert!(matches!(err, CalcError::ParseInt(_)));
        assert!(err.to_string().contains("unable to parse"));
    }

    #[test]
    fn symtab_error_is_transparent() {
        let err: CalcError = SymTabError::Undefined { name: "y".into() }.into();
        assert!(matches!(err, CalcError::SymTab(_)));
        assert_eq!(err.to_string(), "undefined variable y");
    }

    #[test]
    fn arithmetic_messages() {
        assert_eq!(CalcError::DivisionByZero.to_string(), "division by zero");
        assert_eq!(CalcError::Overflow.to_string(), "integer overflow");
    }

    fn _assert_send_sync_static<T: Send + Sync + 'static>() {}
    #[test]
    fn calc_error_is_send_sync_static() {
        _assert_send_sync_static::<CalcError>();
    }
}
