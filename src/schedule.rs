// src/schedule.rs
//! Cron-style triggers for the two publication workers.
//!
//! Standard 5-field syntax (min hour dom mon dow), evaluated in UTC.
//! Supports `*`, lists, ranges and steps. When both day-of-month and
//! day-of-week are restricted, a time matches if EITHER matches.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Datelike, Timelike, Utc};
use tokio::task::JoinHandle;

use crate::error::{PipelineError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CronExpr {
    source: String,
    min: Field,
    hour: Field,
    dom: Field,
    mon: Field,
    dow: Field,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Field {
    min: u32,
    max: u32,
    any: bool,
    allowed: Vec<bool>, // index = value
}

impl CronExpr {
    pub fn parse(expr: &str) -> Result<Self> {
        let parts = expr.split_whitespace().collect::<Vec<_>>();
        if parts.len() != 5 {
            return Err(PipelineError::config(format!(
                "cron `{expr}`: expected 5 fields, got {}",
                parts.len()
            )));
        }

        let field = |raw: &str, min, max, dow| {
            Field::parse(raw, min, max, dow)
                .map_err(|e| PipelineError::config(format!("cron `{expr}`: {e}")))
        };

        let parsed = Self {
            source: expr.trim().to_string(),
            min: field(parts[0], 0, 59, false)?,
            hour: field(parts[1], 0, 23, false)?,
            dom: field(parts[2], 1, 31, false)?,
            mon: field(parts[3], 1, 12, false)?,
            dow: field(parts[4], 0, 6, true)?,
        };

        // e.g. `0 0 30 2 *`: syntactically fine, never fires
        if parsed.next_after(Utc::now()).is_none() {
            return Err(PipelineError::config(format!("cron `{expr}`: never fires")));
        }
        Ok(parsed)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, dt: DateTime<Utc>) -> bool {
        if !self.min.contains(dt.minute())
            || !self.hour.contains(dt.hour())
            || !self.mon.contains(dt.month())
        {
            return false;
        }

        let dom_match = self.dom.contains(dt.day());
        let dow_match = self.dow.contains(dt.weekday().num_days_from_sunday());

        match (self.dom.any, self.dow.any) {
            (true, true) => true,
            (true, false) => dow_match,
            (false, true) => dom_match,
            (false, false) => dom_match || dow_match,
        }
    }

    /// First matching minute strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut t = (now + chrono::Duration::minutes(1))
            .with_second(0)?
            .with_nanosecond(0)?;

        // a leap-day-only expression needs up to four years
        let max_iters = 4 * 366 * 24 * 60;
        for _ in 0..max_iters {
            if self.matches(t) {
                return Some(t);
            }
            t += chrono::Duration::minutes(1);
        }
        None
    }
}

impl std::fmt::Display for CronExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

impl Field {
    fn parse(raw: &str, min: u32, max: u32, allow_7_as_0: bool) -> std::result::Result<Self, String> {
        let raw = raw.trim();
        // day-of-week also accepts 7 for Sunday; folded onto 0 below
        let upper = if allow_7_as_0 { max + 1 } else { max };
        let mut allowed = vec![false; (upper + 1) as usize];

        for part in raw.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(format!("empty list element in `{raw}`"));
            }

            let (base, step) = match part.split_once('/') {
                Some((a, b)) => {
                    let step: u32 = b
                        .trim()
                        .parse()
                        .map_err(|_| format!("invalid step: {b}"))?;
                    if step == 0 {
                        return Err("step must be > 0".to_string());
                    }
                    (a.trim(), step)
                }
                None => (part, 1),
            };

            let (start, end) = if base == "*" {
                (min, max)
            } else if let Some((a, b)) = base.split_once('-') {
                (parse_u32(a)?, parse_u32(b)?)
            } else {
                let a = parse_u32(base)?;
                if part.contains('/') {
                    (a, max)
                } else {
                    (a, a)
                }
            };

            if start < min || end > upper || start > end {
                return Err(format!("value out of range {min}-{upper}: {base}"));
            }

            let mut v = start;
            while v <= end {
                allowed[v as usize] = true;
                v = v.saturating_add(step);
            }
        }

        if allow_7_as_0 && allowed[upper as usize] {
            allowed[0] = true;
        }
        allowed.truncate((max + 1) as usize);

        // only a bare wildcard leaves the field unrestricted; `1-31` still counts as a restriction
        let any = raw == "*" || raw == "*/1";
        Ok(Self {
            min,
            max,
            any,
            allowed,
        })
    }

    fn contains(&self, v: u32) -> bool {
        v >= self.min && v <= self.max && self.allowed.get(v as usize).copied().unwrap_or(false)
    }
}

fn parse_u32(s: &str) -> std::result::Result<u32, String> {
    s.trim().parse().map_err(|_| format!("invalid number: {s}"))
}

/// Next fire time after `now`, never at or before `last_fire`.
///
/// `tokio::time::sleep` runs on the monotonic clock and may wake slightly
/// before the wall-clock minute; anchoring on the last fire keeps that
/// minute from being picked twice.
pub fn next_fire(
    expr: &CronExpr,
    now: DateTime<Utc>,
    last_fire: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    let from = match last_fire {
        Some(last) if last > now => last,
        _ => now,
    };
    expr.next_after(from)
}

/// Spawn a task firing `job` at every match of `expr`.
///
/// The job is awaited before the next fire time is computed, so runs of the
/// same schedule never overlap. A run that outlasts a fire time skips it.
pub fn spawn_schedule<F, Fut>(name: &'static str, expr: CronExpr, job: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tracing::info!(target: "schedule", job = name, cron = %expr, "schedule started");
        let mut last_fire = None;
        loop {
            let now = Utc::now();
            let Some(next) = next_fire(&expr, now, last_fire) else {
                tracing::warn!(target: "schedule", job = name, cron = %expr, "no next run, stopping");
                break;
            };
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            tracing::debug!(target: "schedule", job = name, next = %next, "sleeping until next run");
            tokio::time::sleep(wait).await;
            last_fire = Some(next);
            job().await;
        }
    })
}
