//! Argument validation.
//!
//! Every check here is pure and runs before a call touches the database,
//! so a rejected call leaves no trace.

use regex::Regex;

use crate::error::{CatalogueError, CatalogueResult};

/// Requires a string argument to be non-empty.
pub fn non_empty(field: &'static str, value: &str) -> CatalogueResult<()> {
    if value.is_empty() {
        return Err(CatalogueError::EmptyField { field });
    }

    Ok(())
}

/// Requires an optional string argument to be non-empty when present.
pub fn non_empty_if_present(field: &'static str, value: Option<&str>) -> CatalogueResult<()> {
    match value {
        Some(value) => non_empty(field, value),
        None => Ok(()),
    }
}

/// Requires a numeric argument to be non-zero.
pub fn non_zero(field: &'static str, value: u64) -> CatalogueResult<()> {
    if value == 0 {
        return Err(CatalogueError::ZeroField { field });
    }

    Ok(())
}

/// Converts an unsigned argument to its stored representation.
pub fn db_int(field: &'static str, value: u64) -> CatalogueResult<i64> {
    i64::try_from(value).map_err(|_| CatalogueError::OutOfRange {
        field,
        reason: format!("{} does not fit in a signed 64-bit integer", value),
    })
}

/// Converts a copy number to its stored representation.
pub fn copy_nb(value: u64) -> CatalogueResult<i32> {
    non_zero("copy_nb", value)?;
    i32::try_from(value).map_err(|_| CatalogueError::OutOfRange {
        field: "copy_nb",
        reason: format!("{} is not a valid copy number", value),
    })
}

/// Requires a fair share weight to lie in (0, 1].
pub fn fair_share_weight(weight: f64) -> CatalogueResult<()> {
    if !(weight > 0.0 && weight <= 1.0) {
        return Err(CatalogueError::OutOfRange {
            field: "weight",
            reason: format!("{} is not in (0, 1]", weight),
        });
    }

    Ok(())
}

/// Requires a string to be a valid regular expression.
pub fn file_regexp(value: &str) -> CatalogueResult<()> {
    non_empty("file_regexp", value)?;
    Regex::new(value).map_err(|e| CatalogueError::OutOfRange {
        field: "file_regexp",
        reason: e.to_string(),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strings() {
        non_empty("vid", "V00001").unwrap();
        assert!(matches!(
            non_empty("vid", ""),
            Err(CatalogueError::EmptyField { field: "vid" })
        ));

        non_empty_if_present("supply", None).unwrap();
        non_empty_if_present("supply", Some("pool")).unwrap();
        assert!(matches!(
            non_empty_if_present("supply", Some("")),
            Err(CatalogueError::EmptyField { field: "supply" })
        ));
    }

    #[test]
    fn test_numbers() {
        non_zero("capacity_in_bytes", 1).unwrap();
        assert!(matches!(
            non_zero("capacity_in_bytes", 0),
            Err(CatalogueError::ZeroField {
                field: "capacity_in_bytes"
            })
        ));

        assert_eq!(42, db_int("size", 42).unwrap());
        assert!(matches!(
            db_int("size", u64::MAX),
            Err(CatalogueError::OutOfRange { field: "size", .. })
        ));

        assert_eq!(2, copy_nb(2).unwrap());
        assert!(matches!(copy_nb(0), Err(CatalogueError::ZeroField { .. })));
        assert!(matches!(
            copy_nb(u64::from(u32::MAX)),
            Err(CatalogueError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_fair_share_weight() {
        fair_share_weight(1.0).unwrap();
        fair_share_weight(0.25).unwrap();

        for weight in [0.0, -0.5, 1.01, f64::NAN] {
            assert!(matches!(
                fair_share_weight(weight),
                Err(CatalogueError::OutOfRange { field: "weight", .. })
            ));
        }
    }

    #[test]
    fn test_file_regexp() {
        file_regexp("^root://eos-.*/").unwrap();
        assert!(matches!(
            file_regexp(""),
            Err(CatalogueError::EmptyField { .. })
        ));
        assert!(matches!(
            file_regexp("^root://(unclosed"),
            Err(CatalogueError::OutOfRange { .. })
        ));
    }
}
