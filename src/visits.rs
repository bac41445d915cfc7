//! Per-session visit counting.
//!
//! Each session stores a visit counter and the time of the last counted
//! visit. A request counts as a new visit only when at least one full day
//! has passed since that time; otherwise both values are written back
//! unchanged.
//!
//! The timestamp is stored as RFC 3339 and parsed as such. Anything else in
//! the `last_visit` slot is an error, surfaced to the caller rather than
//! silently reset.

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;
use tower_sessions::Session;

pub const VISITS_KEY: &str = "visits";
pub const LAST_VISIT_KEY: &str = "last_visit";

#[derive(Error, Debug)]
pub enum VisitError {
    #[error("session store error: {0}")]
    Session(#[from] tower_sessions::session::Error),
    #[error("malformed last_visit timestamp {value:?}: {source}")]
    MalformedTimestamp {
        value: String,
        source: chrono::ParseError,
    },
}

/// Visit state as stored in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitRecord {
    pub visits: u64,
    pub last_visit: DateTime<Utc>,
}

/// Compute the visit state to store after a request made at `now`.
///
/// A missing (or zero) counter starts at 1 and a missing timestamp counts as
/// `now`. The counter goes up by one, and the timestamp moves to `now`, only
/// if `last_visit` is at least a day old.
pub fn next_visit(
    visits: Option<u64>,
    last_visit: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> VisitRecord {
    let visits = visits.filter(|&v| v > 0).unwrap_or(1);
    let last_visit = last_visit.unwrap_or(now);

    if (now - last_visit).num_days() > 0 {
        VisitRecord {
            visits: visits + 1,
            last_visit: now,
        }
    } else {
        VisitRecord { visits, last_visit }
    }
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, VisitError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|source| VisitError::MalformedTimestamp {
            value: value.to_string(),
            source,
        })
}

/// Read the session's visit state, advance it to `now`, and store it back.
pub async fn track_visit(session: &Session, now: DateTime<Utc>) -> Result<VisitRecord, VisitError> {
    let visits: Option<u64> = session.get(VISITS_KEY).await?;
    let last_visit = session
        .get::<String>(LAST_VISIT_KEY)
        .await?
        .map(|raw| parse_timestamp(&raw))
        .transpose()?;

    let record = next_visit(visits, last_visit, now);

    session
        .insert(LAST_VISIT_KEY, format_timestamp(record.last_visit))
        .await?;
    session.insert(VISITS_KEY, record.visits).await?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[test]
    fn first_visit_defaults() {
        let record = next_visit(None, None, now());
        assert_eq!(record.visits, 1);
        assert_eq!(record.last_visit, now());
    }

    #[test]
    fn zero_counter_treated_as_absent() {
        assert_eq!(next_visit(Some(0), None, now()).visits, 1);
    }

    #[test]
    fn a_day_later_increments_and_moves_timestamp() {
        for v in [1, 2, 7, 1000] {
            let last = now() - Duration::days(1);
            let record = next_visit(Some(v), Some(last), now());
            assert_eq!(record.visits, v + 1);
            assert_eq!(record.last_visit, now());
        }
    }

    #[test]
    fn several_days_later_increments_once() {
        let last = now() - Duration::days(30);
        let record = next_visit(Some(3), Some(last), now());
        assert_eq!(record.visits, 4);
    }

    #[test]
    fn within_a_day_is_unchanged() {
        for v in [1, 5, 42] {
            for age in [
                Duration::zero(),
                Duration::seconds(1),
                Duration::hours(23),
                Duration::days(1) - Duration::microseconds(1),
            ] {
                let last = now() - age;
                let record = next_visit(Some(v), Some(last), now());
                assert_eq!(record.visits, v);
                assert_eq!(record.last_visit, last);
            }
        }
    }

    #[test]
    fn future_timestamp_is_unchanged() {
        let last = now() + Duration::days(3);
        let record = next_visit(Some(2), Some(last), now());
        assert_eq!(record, VisitRecord { visits: 2, last_visit: last });
    }

    #[test]
    fn timestamp_format_roundtrips() {
        let ts = now() + Duration::microseconds(123_456);
        assert_eq!(parse_timestamp(&format_timestamp(ts)).unwrap(), ts);
    }

    #[test]
    fn legacy_naive_timestamp_rejected() {
        let err = parse_timestamp("2026-10-16 12:00:00.123456").unwrap_err();
        assert!(matches!(err, VisitError::MalformedTimestamp { .. }));
    }

    #[tokio::test]
    async fn track_visit_initializes_session() {
        let session = session();
        let record = track_visit(&session, now()).await.unwrap();
        assert_eq!(record.visits, 1);

        let stored: Option<u64> = session.get(VISITS_KEY).await.unwrap();
        assert_eq!(stored, Some(1));
        let stored: Option<String> = session.get(LAST_VISIT_KEY).await.unwrap();
        assert_eq!(stored, Some(format_timestamp(now())));
    }

    #[tokio::test]
    async fn track_visit_counts_a_return_after_two_days() {
        let session = session();
        let two_days_ago = now() - Duration::days(2);
        session.insert(VISITS_KEY, 4u64).await.unwrap();
        session
            .insert(LAST_VISIT_KEY, format_timestamp(two_days_ago))
            .await
            .unwrap();

        let record = track_visit(&session, now()).await.unwrap();
        assert_eq!(record.visits, 5);
        assert_eq!(record.last_visit, now());
    }

    #[tokio::test]
    async fn track_visit_same_day_keeps_state() {
        let session = session();
        let earlier = now() - Duration::hours(3);
        session.insert(VISITS_KEY, 4u64).await.unwrap();
        session
            .insert(LAST_VISIT_KEY, format_timestamp(earlier))
            .await
            .unwrap();

        track_visit(&session, now()).await.unwrap();
        let record = track_visit(&session, now()).await.unwrap();
        assert_eq!(record, VisitRecord { visits: 4, last_visit: earlier });
    }

    #[tokio::test]
    async fn track_visit_malformed_timestamp_is_error() {
        let session = session();
        session.insert(LAST_VISIT_KEY, "yesterday-ish").await.unwrap();
        let err = track_visit(&session, now()).await.unwrap_err();
        assert!(matches!(err, VisitError::MalformedTimestamp { .. }));
    }
}
