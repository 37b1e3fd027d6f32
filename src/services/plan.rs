//! Subscription plan state: trial countdown and operator plan changes

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;
use tracing::info;

use crate::store::{DocumentStore, USERS};
use crate::types::{
    DashError, Document, Plan, PlanState, PlanUpdate, Result, UserRecord, NO_PLAN,
};

/// Length of a trial from its activation date
pub const TRIAL_LENGTH_DAYS: i64 = 14;

pub const CURRENT_PLAN_FIELD: &str = "current_plan";
pub const TRIAL_ACTIVATED_FIELD: &str = "trial_activated_date";
pub const LAST_UPGRADE_FIELD: &str = "last_plan_upgrade_date";

/// Parse a stored ISO-8601 timestamp.
///
/// Accepts RFC 3339 with any number of fractional digits (including none),
/// and offset-less `YYYY-MM-DDTHH:MM:SS[.ffffff]`, which is read as UTC.
pub fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| DashError::Timestamp {
            field: field.to_string(),
            value: value.to_string(),
        })
}

/// Format a timestamp the way plan changes are stored:
/// UTC with microseconds, e.g. `2024-01-01T00:00:00.000000Z`
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Whole days left in a trial activated at `activation`, floored and never negative
pub fn trial_days_left(activation: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let remaining = activation + Duration::days(TRIAL_LENGTH_DAYS) - now;
    if remaining <= Duration::zero() {
        return 0;
    }
    u32::try_from(remaining.num_days()).unwrap_or(u32::MAX)
}

/// Plan string and trial countdown for a user record.
///
/// `None` (no user document) is the initial "No Plan" state. An expired
/// trial keeps its stored plan and reports zero days.
pub fn plan_state(record: Option<&UserRecord>, now: DateTime<Utc>) -> Result<PlanState> {
    let Some(record) = record else {
        return Ok(PlanState::default());
    };

    let plan = record
        .current_plan
        .clone()
        .unwrap_or_else(|| NO_PLAN.to_string());

    let days_left = match record.trial_activated_date.as_deref() {
        Some(raw) => trial_days_left(parse_timestamp(TRIAL_ACTIVATED_FIELD, raw)?, now),
        None => 0,
    };

    Ok(PlanState { plan, days_left })
}

/// Build the user-document patch for an operator plan change.
///
/// `current_plan` is written with the caller's casing, surrounding whitespace
/// stripped. A trial always restarts its clock; a premium upgrade records the
/// upgrade date.
pub fn build_patch(requested: &str, now: DateTime<Utc>) -> Result<(Plan, Document)> {
    let requested = requested.trim();
    let plan: Plan = requested.parse()?;
    let stamp = format_timestamp(now);

    let mut fields = Document::new();
    fields.insert(
        CURRENT_PLAN_FIELD.to_string(),
        Value::String(requested.to_string()),
    );
    match plan {
        Plan::Trial => {
            fields.insert(TRIAL_ACTIVATED_FIELD.to_string(), Value::String(stamp));
        }
        Plan::Premium => {
            fields.insert(LAST_UPGRADE_FIELD.to_string(), Value::String(stamp));
        }
        Plan::Inactive => {}
    }
    Ok((plan, fields))
}

/// Apply a plan change to the `users` collection
pub fn update_plan(
    store: &dyn DocumentStore,
    user_id: &str,
    requested: &str,
    now: DateTime<Utc>,
) -> Result<PlanUpdate> {
    let (plan, fields) = build_patch(requested, now)?;

    let field = |name: &str| fields.get(name).and_then(Value::as_str).map(String::from);
    let update = PlanUpdate {
        user_id: user_id.to_string(),
        current_plan: requested.trim().to_string(),
        plan,
        trial_activated_date: field(TRIAL_ACTIVATED_FIELD),
        last_plan_upgrade_date: field(LAST_UPGRADE_FIELD),
    };

    store.patch_document(USERS, user_id, fields)?;
    info!(user_id, plan = %plan, store = store.name(), "plan updated");
    Ok(update)
}
