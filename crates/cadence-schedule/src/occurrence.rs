//! Occurrence generation.
//!
//! An assignment's date range is cut into periods of one day (daily) or seven
//! days (weekly), anchored at `start_date` midnight in the schedule's time
//! zone. Each period holds at most `frequency_count` occurrences. The planned
//! slots of a period are spread evenly over its in-window time, so a daily
//! 09:00–21:00 window with three occurrences plans 09:00, 13:00 and 17:00.
//!
//! The generator never plans ahead more than one occurrence: it answers
//! "given what has been issued so far, is one due right now, and if not,
//! when?". An occurrence is stamped with the instant it became due, not the
//! instant the sweep noticed, so a lagging sweep does not push the rest of
//! the period later. A slot noticed only after its deadline would have
//! passed is stale; it is issued as of the evaluation instant instead.

use jiff::civil::{Date, Time};
use jiff::tz::TimeZone;
use jiff::{SignedDuration, Span, Timestamp};

use cadence_core::models::assignment::{Assignment, AssignmentStatus, AssignmentType};

use crate::error::ScheduleError;
use crate::validate::validate_schedule;

/// What the sweep should do with an assignment right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Issue an occurrence at `scheduled_at`. `next_scheduled_at` is the due
    /// time of the one after it, `None` when this is the last.
    Generate {
        scheduled_at: Timestamp,
        next_scheduled_at: Option<Timestamp>,
    },
    /// Nothing is due yet.
    Wait { next_scheduled_at: Timestamp },
    /// No further occurrence can ever be generated.
    Exhausted,
    /// Paused or completed; the generator does not look at it.
    Inactive,
}

/// An assignment's schedule laid out on the calendar of one time zone.
pub struct Schedule<'a> {
    assignment: &'a Assignment,
    tz: &'a TimeZone,
}

impl<'a> Schedule<'a> {
    pub fn new(assignment: &'a Assignment, tz: &'a TimeZone) -> Self {
        Self { assignment, tz }
    }

    /// Decide whether a new occurrence must be issued at `now`, given the
    /// `scheduled_at` of every occurrence issued so far.
    pub fn evaluate(&self, history: &[Timestamp], now: Timestamp) -> Result<Decision, ScheduleError> {
        if self.assignment.status != AssignmentStatus::Active {
            return Ok(Decision::Inactive);
        }
        validate_schedule(self.assignment)?;
        if self.has_ended(now)? {
            return Ok(Decision::Exhausted);
        }

        if self.assignment.assignment_type == AssignmentType::Immediate {
            // Window and frequency rules do not apply.
            let starts_at = self.starts_at()?;
            if history.is_empty() && now < starts_at {
                return Ok(Decision::Wait {
                    next_scheduled_at: starts_at,
                });
            }
            return Ok(if history.is_empty() {
                Decision::Generate {
                    scheduled_at: now,
                    next_scheduled_at: None,
                }
            } else {
                Decision::Exhausted
            });
        }

        let Some(due) = self.next_due(history, now)? else {
            return Ok(Decision::Exhausted);
        };

        if due > now {
            return Ok(Decision::Wait {
                next_scheduled_at: due,
            });
        }

        if now < due.checked_add(self.deadline())? {
            return self.issue(history, due, now);
        }

        // Stale: issue now if the window is open, otherwise at its next opening.
        if self.in_window(now) {
            return self.issue(history, now, now);
        }
        let reopens = self.snap(now)?;
        match self.next_due(history, reopens)? {
            Some(next) => Ok(Decision::Wait {
                next_scheduled_at: next.max(reopens),
            }),
            None => Ok(Decision::Exhausted),
        }
    }

    fn issue(
        &self,
        history: &[Timestamp],
        scheduled_at: Timestamp,
        now: Timestamp,
    ) -> Result<Decision, ScheduleError> {
        let mut issued = history.to_vec();
        issued.push(scheduled_at);
        Ok(Decision::Generate {
            scheduled_at,
            next_scheduled_at: self.next_due(&issued, now)?,
        })
    }

    /// Earliest instant at which the next occurrence may be issued, or `None`
    /// when the date range has no room left. Periods that ended before `now`
    /// are not back-filled.
    pub fn next_due(
        &self,
        history: &[Timestamp],
        now: Timestamp,
    ) -> Result<Option<Timestamp>, ScheduleError> {
        let per_period = self.assignment.frequency_count as usize;
        let floor = match history.iter().max() {
            Some(last) => last.checked_add(self.min_gap())?,
            None => self.starts_at()?,
        };
        let ends_at = self.ends_at()?;

        let mut period = self.period_of(floor)?.max(self.period_of(now)?);
        loop {
            let period_start = self.period_start(period)?;
            if period_start >= ends_at {
                return Ok(None);
            }
            let period_end = self.period_start(period + 1)?;

            let used = history
                .iter()
                .filter(|t| **t >= period_start && **t < period_end)
                .count();

            if used < per_period {
                for slot in self.planned_slots(period)?.into_iter().skip(used) {
                    let candidate = self.snap(slot.max(floor))?;
                    if candidate >= period_end || candidate >= ends_at {
                        break;
                    }
                    return Ok(Some(candidate));
                }
            }

            period += 1;
        }
    }

    /// The evenly spread slots of period `period`, before spacing is applied.
    pub fn planned_slots(&self, period: i64) -> Result<Vec<Timestamp>, ScheduleError> {
        let (open, close) = self.window();
        let width = close - open;
        if width <= 0 {
            return Err(ScheduleError::InvalidSchedule {
                reasons: vec!["window is empty".to_string()],
            });
        }
        let days = i64::from(self.assignment.frequency_type.period_days());
        let count = i64::from(self.assignment.frequency_count.max(1));
        let in_window_total = width * days;
        let first_day = add_days(self.assignment.start_date, period * days)?;

        (0..count)
            .map(|i| {
                let offset = i * in_window_total / count;
                let day = add_days(first_day, offset / width)?;
                self.at(day, open + offset % width)
            })
            .collect()
    }

    /// Whether the time of day of `t` falls inside the window, bounds included.
    pub fn in_window(&self, t: Timestamp) -> bool {
        let (open, close) = self.window();
        let secs = seconds_of_day(t.to_zoned(self.tz.clone()).time());
        secs >= open && secs <= close
    }

    /// Whether the date range is over at `now`.
    pub fn has_ended(&self, now: Timestamp) -> Result<bool, ScheduleError> {
        Ok(now >= self.ends_at()?)
    }

    /// Midnight starting `start_date`.
    pub fn starts_at(&self) -> Result<Timestamp, ScheduleError> {
        self.at(self.assignment.start_date, 0)
    }

    /// Midnight following `end_date`; the range is inclusive of `end_date`.
    pub fn ends_at(&self) -> Result<Timestamp, ScheduleError> {
        self.at(add_days(self.assignment.end_date, 1)?, 0)
    }

    /// Index of the period containing `t`. Instants before the start fall
    /// into period zero.
    pub fn period_of(&self, t: Timestamp) -> Result<i64, ScheduleError> {
        let date = t.to_zoned(self.tz.clone()).date();
        let days = i64::from(self.assignment.start_date.until(date)?.get_days());
        Ok(days.max(0) / i64::from(self.assignment.frequency_type.period_days()))
    }

    pub fn period_start(&self, period: i64) -> Result<Timestamp, ScheduleError> {
        let days = period * i64::from(self.assignment.frequency_type.period_days());
        self.at(add_days(self.assignment.start_date, days)?, 0)
    }

    /// Move `t` into the window: before it, to its opening the same day;
    /// after it, to its opening the next day.
    fn snap(&self, t: Timestamp) -> Result<Timestamp, ScheduleError> {
        let (open, close) = self.window();
        let local = t.to_zoned(self.tz.clone());
        let secs = seconds_of_day(local.time());
        if secs < open {
            self.at(local.date(), open)
        } else if secs > close {
            self.at(add_days(local.date(), 1)?, open)
        } else {
            Ok(t)
        }
    }

    fn window(&self) -> (i64, i64) {
        (
            seconds_of_day(self.assignment.window_start),
            seconds_of_day(self.assignment.window_end),
        )
    }

    fn min_gap(&self) -> SignedDuration {
        SignedDuration::from_hours(i64::from(self.assignment.min_hours_between))
    }

    fn deadline(&self) -> SignedDuration {
        SignedDuration::from_hours(i64::from(self.assignment.deadline_hours))
    }

    fn at(&self, date: Date, seconds: i64) -> Result<Timestamp, ScheduleError> {
        let time = Time::new(
            (seconds / 3600) as i8,
            (seconds % 3600 / 60) as i8,
            (seconds % 60) as i8,
            0,
        )?;
        Ok(date.to_datetime(time).to_zoned(self.tz.clone())?.timestamp())
    }
}

/// Seconds since midnight, ignoring sub-second precision.
pub fn seconds_of_day(time: Time) -> i64 {
    i64::from(time.hour()) * 3600 + i64::from(time.minute()) * 60 + i64::from(time.second())
}

fn add_days(date: Date, days: i64) -> Result<Date, ScheduleError> {
    Ok(date.checked_add(Span::new().try_days(days)?)?)
}
