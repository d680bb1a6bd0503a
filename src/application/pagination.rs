//! Listing request validation and pagination strategy selection.
//!
//! Raw query parameters arrive as strings and pass through
//! [`ListingRequest::from_raw`] exactly once; everything downstream works
//! with the validated request.

use serde::Deserialize;
use thiserror::Error;

/// Page size applied when the caller does not send `limit`.
pub const DEFAULT_LIMIT: u32 = 50;

/// Raw query parameters as received on the wire, before numeric coercion.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawListingParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub turbo: Option<String>,
    #[serde(rename = "afterId")]
    pub after_id: Option<String>,
}

/// A pagination or benchmark parameter that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid `{field}`: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Validated caller intent for one listing call.
///
/// Both constructors enforce the parameter bounds, so holding a
/// `ListingRequest` means the parameters are in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingRequest {
    limit: u32,
    offset: u64,
    turbo: bool,
    after_id: Option<i64>,
}

/// The query mode handed to the store adapter. Both variants order
/// ascending by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSelection {
    /// Skip `offset` rows, take `limit`.
    Offset { limit: u32, offset: u64 },
    /// Rows with `id > after_id`, take `limit`.
    Keyset { limit: u32, after_id: i64 },
}

impl ListingRequest {
    /// Validate already-typed parameters against the configured ceiling.
    pub fn new(
        limit: u32,
        offset: u64,
        turbo: bool,
        after_id: Option<i64>,
        max_limit: u32,
    ) -> Result<Self, ValidationError> {
        if limit == 0 || limit > max_limit {
            return Err(ValidationError::new(
                "limit",
                format!("must be between 1 and {max_limit}"),
            ));
        }
        if let Some(id) = after_id
            && id <= 0
        {
            return Err(ValidationError::new(
                "afterId",
                "must be a positive integer",
            ));
        }

        Ok(Self {
            limit,
            offset,
            turbo,
            after_id,
        })
    }

    /// Parse and validate raw string parameters.
    ///
    /// Pure: no I/O, no defaults beyond the documented ones (limit 50,
    /// offset 0, turbo false, no cursor).
    pub fn from_raw(raw: &RawListingParams, max_limit: u32) -> Result<Self, ValidationError> {
        let limit = match raw.limit.as_deref() {
            None => DEFAULT_LIMIT,
            Some(value) => value.trim().parse::<u32>().map_err(|_| {
                ValidationError::new("limit", format!("must be an integer between 1 and {max_limit}"))
            })?,
        };

        let offset = match raw.offset.as_deref() {
            None => 0,
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|_| ValidationError::new("offset", "must be a non-negative integer"))?,
        };

        let turbo = match raw.turbo.as_deref() {
            None => false,
            Some(value) => parse_bool_param(value)
                .ok_or_else(|| ValidationError::new("turbo", "must be a boolean"))?,
        };

        let after_id = match raw.after_id.as_deref() {
            None => None,
            Some(value) => Some(
                value
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| ValidationError::new("afterId", "must be a positive integer"))?,
            ),
        };

        Self::new(limit, offset, turbo, after_id, max_limit)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn turbo(&self) -> bool {
        self.turbo
    }

    pub fn after_id(&self) -> Option<i64> {
        self.after_id
    }

    /// Decide the query mode: a present cursor selects key-set pagination
    /// and the offset is ignored (documented, not an error).
    pub fn selection(&self) -> PageSelection {
        match self.after_id {
            Some(after_id) => PageSelection::Keyset {
                limit: self.limit,
                after_id,
            },
            None => PageSelection::Offset {
                limit: self.limit,
                offset: self.offset,
            },
        }
    }
}

pub(crate) fn parse_bool_param(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "TRUE" | "True" | "1" => Some(true),
        "false" | "FALSE" | "False" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: u32 = 1000;

    #[test]
    fn defaults_apply_when_params_absent() {
        let request = ListingRequest::from_raw(&RawListingParams::default(), MAX).expect("valid");

        assert_eq!(request.limit(), DEFAULT_LIMIT);
        assert_eq!(request.offset(), 0);
        assert!(!request.turbo());
        assert_eq!(request.after_id(), None);
    }

    #[test]
    fn cursor_selects_keyset_and_offset_is_ignored() {
        let raw = RawListingParams {
            limit: Some("10".into()),
            offset: Some("7".into()),
            after_id: Some("42".into()),
            ..Default::default()
        };

        let request = ListingRequest::from_raw(&raw, MAX).expect("valid");
        assert_eq!(
            request.selection(),
            PageSelection::Keyset {
                limit: 10,
                after_id: 42
            }
        );
    }

    #[test]
    fn absent_cursor_selects_offset_mode() {
        let raw = RawListingParams {
            limit: Some("10".into()),
            offset: Some("7".into()),
            ..Default::default()
        };

        let request = ListingRequest::from_raw(&raw, MAX).expect("valid");
        assert_eq!(
            request.selection(),
            PageSelection::Offset {
                limit: 10,
                offset: 7
            }
        );
    }

    #[test]
    fn limit_bounds_are_enforced() {
        for bad in ["0", "1001"] {
            let raw = RawListingParams {
                limit: Some(bad.into()),
                ..Default::default()
            };
            let err = ListingRequest::from_raw(&raw, MAX).expect_err("out of range");
            assert_eq!(err.field, "limit");
        }

        for good in ["1", "1000"] {
            let raw = RawListingParams {
                limit: Some(good.into()),
                ..Default::default()
            };
            assert!(ListingRequest::from_raw(&raw, MAX).is_ok());
        }
    }

    #[test]
    fn non_integer_limit_is_rejected() {
        for bad in ["ten", "10.5", "-3", ""] {
            let raw = RawListingParams {
                limit: Some(bad.into()),
                ..Default::default()
            };
            let err = ListingRequest::from_raw(&raw, MAX).expect_err("not an integer");
            assert_eq!(err.field, "limit");
        }
    }

    #[test]
    fn negative_offset_is_rejected() {
        let raw = RawListingParams {
            offset: Some("-1".into()),
            ..Default::default()
        };
        let err = ListingRequest::from_raw(&raw, MAX).expect_err("negative offset");
        assert_eq!(err.field, "offset");
    }

    #[test]
    fn after_id_must_be_positive() {
        for bad in ["0", "-5", "abc"] {
            let raw = RawListingParams {
                after_id: Some(bad.into()),
                ..Default::default()
            };
            let err = ListingRequest::from_raw(&raw, MAX).expect_err("bad cursor");
            assert_eq!(err.field, "afterId");
        }
    }

    #[test]
    fn turbo_accepts_boolish_values() {
        for (value, expected) in [("true", true), ("1", true), ("false", false), ("0", false)] {
            let raw = RawListingParams {
                turbo: Some(value.into()),
                ..Default::default()
            };
            let request = ListingRequest::from_raw(&raw, MAX).expect("valid");
            assert_eq!(request.turbo(), expected);
        }

        let raw = RawListingParams {
            turbo: Some("maybe".into()),
            ..Default::default()
        };
        let err = ListingRequest::from_raw(&raw, MAX).expect_err("bad turbo");
        assert_eq!(err.field, "turbo");
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        let raw = RawListingParams {
            limit: Some(" 25 ".into()),
            offset: Some(" 3 ".into()),
            ..Default::default()
        };

        let request = ListingRequest::from_raw(&raw, MAX).expect("valid");
        assert_eq!(request.limit(), 25);
        assert_eq!(request.offset(), 3);
    }

    #[test]
    fn configured_ceiling_applies_to_typed_constructor() {
        let err = ListingRequest::new(51, 0, false, None, 50).expect_err("over ceiling");
        assert_eq!(err.field, "limit");

        assert!(ListingRequest::new(50, 0, false, None, 50).is_ok());
    }
}
