use cadence_core::models::completion::{Completion, CompletionStatus};
use cadence_core::models::stats::CompletionStats;

/// Count on-time, late, missed and outstanding occurrences.
pub fn completion_stats<'a>(completions: impl IntoIterator<Item = &'a Completion>) -> CompletionStats {
    let mut stats = CompletionStats::default();
    for completion in completions {
        stats.total += 1;
        match completion.status {
            CompletionStatus::Completed if completion.is_delayed => stats.late += 1,
            CompletionStatus::Completed => stats.on_time += 1,
            CompletionStatus::Missed => stats.missed += 1,
            CompletionStatus::Pending | CompletionStatus::Sent => stats.outstanding += 1,
        }
        if !completion.status.is_outstanding() && !completion.read_by_therapist {
            stats.unread += 1;
        }
    }
    stats
}
