// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Timestamp encoding shared by all tables.
//!
//! Timestamps are stored as RFC 3339 UTC text with a fixed microsecond width
//! (`2026-01-01T00:00:00.000000Z`). Fixed width keeps lexical order equal to
//! chronological order, which the TTL filters rely on.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::DbError;

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
	ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, DbError> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("Invalid {column}: {e}")))
}
