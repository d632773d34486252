use cadence_core::models::assignment::{Assignment, AssignmentType, FrequencyType};

use crate::error::ScheduleError;
use crate::occurrence::seconds_of_day;

/// Check an assignment's schedule parameters before it is stored or
/// evaluated. Every violation is reported, not just the first.
pub fn validate_schedule(assignment: &Assignment) -> Result<(), ScheduleError> {
    let mut reasons = Vec::new();

    if assignment.start_date > assignment.end_date {
        reasons.push(format!(
            "start date {} is after end date {}",
            assignment.start_date, assignment.end_date
        ));
    }

    if assignment.frequency_count < 1 {
        reasons.push("frequency count must be at least 1".to_string());
    }

    if assignment.window_start >= assignment.window_end {
        reasons.push(format!(
            "window start {} must be before window end {}",
            assignment.window_start, assignment.window_end
        ));
    }

    if assignment.deadline_hours < 1 {
        reasons.push("deadline must be at least 1 hour".to_string());
    }

    if assignment.assignment_type == AssignmentType::Recurring
        && assignment.frequency_count > 1
        && assignment.window_start < assignment.window_end
    {
        let window_hours =
            (seconds_of_day(assignment.window_end) - seconds_of_day(assignment.window_start)) / 3600;
        let available_hours = match assignment.frequency_type {
            FrequencyType::Daily => window_hours,
            // First occurrence at the opening of day one, last at the close of day seven.
            FrequencyType::Weekly => 6 * 24 + window_hours,
        };
        let needed_hours =
            i64::from(assignment.frequency_count - 1) * i64::from(assignment.min_hours_between);
        if needed_hours > available_hours {
            reasons.push(format!(
                "{} occurrences {} hours apart do not fit in {} available hours per period",
                assignment.frequency_count, assignment.min_hours_between, available_hours
            ));
        }
    }

    if reasons.is_empty() {
        Ok(())
    } else {
        Err(ScheduleError::InvalidSchedule { reasons })
    }
}
