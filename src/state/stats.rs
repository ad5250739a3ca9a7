//! Voting statistics engine.
//!
//! Pure functions over a participants snapshot. Facilitators are invisible to
//! every number here, skippers count for nothing numeric, and nothing leaks
//! before the reveal flag flips: callers can run these on every snapshot
//! without masking anything themselves.

use indexmap::IndexMap;
use serde::Serialize;

use crate::{dao::models::ParticipantEntity, state::room::Role};

/// Aggregates for one estimation round.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct VoteStatistics {
    /// Mean of numeric votes, one decimal place. `None` before reveal or when no
    /// numeric votes exist.
    pub average: Option<String>,
    /// Median of numeric votes, one decimal place.
    pub median: Option<String>,
    /// Smallest numeric vote.
    pub min: Option<f64>,
    /// Largest numeric vote.
    pub max: Option<f64>,
    /// Votes cast among eligible voters (includes `?`).
    pub count: usize,
    /// Eligible voting population: participants that are neither facilitators
    /// nor skipping.
    pub total: usize,
    /// Per-value tallies, numerically ascending with `?` ordered first. Empty
    /// before reveal.
    pub distribution: Vec<DistributionEntry>,
}

/// One bar of the vote distribution histogram.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct DistributionEntry {
    /// The card value as cast.
    pub value: String,
    /// How many participants cast it.
    pub count: usize,
    /// Share of all cast votes, rounded to a whole percent.
    pub percentage: u32,
}

/// Voting progress independent of the reveal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct VoteCount {
    /// Eligible voters that have cast a vote.
    pub votes_submitted: usize,
    /// Eligible voting population.
    pub total_participants: usize,
}

impl VoteStatistics {
    fn hidden(total: usize) -> Self {
        Self {
            average: None,
            median: None,
            min: None,
            max: None,
            count: 0,
            total,
            distribution: Vec::new(),
        }
    }
}

/// Compute the round statistics for a participants snapshot.
///
/// Before reveal only `total` is populated; afterwards the distribution covers
/// every cast value while the numeric aggregates ignore `?`.
pub fn calculate_statistics(
    participants: &IndexMap<String, ParticipantEntity>,
    revealed: bool,
) -> VoteStatistics {
    let eligible: Vec<&ParticipantEntity> = participants
        .values()
        .filter(|p| Role::of(p).votes() && !p.has_skipped())
        .collect();
    let total = eligible.len();

    if !revealed {
        return VoteStatistics::hidden(total);
    }

    let cast: Vec<&str> = eligible.iter().filter_map(|p| p.vote.as_deref()).collect();

    let mut tallies: IndexMap<&str, usize> = IndexMap::new();
    for value in &cast {
        *tallies.entry(value).or_insert(0) += 1;
    }

    let mut distribution: Vec<DistributionEntry> = tallies
        .into_iter()
        .map(|(value, count)| DistributionEntry {
            value: value.to_owned(),
            count,
            percentage: if cast.is_empty() {
                0
            } else {
                (count as f64 / cast.len() as f64 * 100.0).round() as u32
            },
        })
        .collect();
    distribution.sort_by(|a, b| match (numeric(&a.value), numeric(&b.value)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        // Sentinels such as `?` sort ahead of every number.
        (None, Some(_)) => std::cmp::Ordering::Less,
        (Some(_), None) => std::cmp::Ordering::Greater,
        (None, None) => a.value.cmp(&b.value),
    });

    let mut numeric_votes: Vec<f64> = cast.iter().filter_map(|v| numeric(v)).collect();
    if numeric_votes.is_empty() {
        return VoteStatistics {
            count: cast.len(),
            total,
            distribution,
            ..VoteStatistics::hidden(total)
        };
    }
    numeric_votes.sort_by(f64::total_cmp);

    let middle = numeric_votes.len() / 2;
    let median = if numeric_votes.len() % 2 == 0 {
        (numeric_votes[middle - 1] + numeric_votes[middle]) / 2.0
    } else {
        numeric_votes[middle]
    };
    let average = numeric_votes.iter().sum::<f64>() / numeric_votes.len() as f64;

    VoteStatistics {
        average: Some(format!("{average:.1}")),
        median: Some(format!("{median:.1}")),
        min: numeric_votes.first().copied(),
        max: numeric_votes.last().copied(),
        count: cast.len(),
        total,
        distribution,
    }
}

/// Count submitted votes for progress indicators, regardless of reveal state.
pub fn count_votes(participants: &IndexMap<String, ParticipantEntity>) -> VoteCount {
    let eligible: Vec<&ParticipantEntity> = participants
        .values()
        .filter(|p| Role::of(p).votes() && !p.has_skipped())
        .collect();

    VoteCount {
        votes_submitted: eligible.iter().filter(|p| p.vote.is_some()).count(),
        total_participants: eligible.len(),
    }
}

fn numeric(value: &str) -> Option<f64> {
    value.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voter(name: &str, vote: Option<&str>) -> ParticipantEntity {
        ParticipantEntity {
            vote: vote.map(str::to_owned),
            ..ParticipantEntity::new(name, false, true, 0)
        }
    }

    fn facilitator(name: &str, vote: Option<&str>) -> ParticipantEntity {
        ParticipantEntity {
            vote: vote.map(str::to_owned),
            ..ParticipantEntity::new(name, false, false, 0)
        }
    }

    fn host(name: &str, vote: Option<&str>) -> ParticipantEntity {
        ParticipantEntity {
            vote: vote.map(str::to_owned),
            ..ParticipantEntity::new(name, true, true, 0)
        }
    }

    fn room(entries: Vec<(&str, ParticipantEntity)>) -> IndexMap<String, ParticipantEntity> {
        entries
            .into_iter()
            .map(|(id, p)| (id.to_owned(), p))
            .collect()
    }

    #[test]
    fn empty_room_yields_empty_stats() {
        let participants = IndexMap::new();
        let stats = calculate_statistics(&participants, true);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.average, None);
        assert!(stats.distribution.is_empty());
    }

    #[test]
    fn unrevealed_stats_never_leak_values() {
        let participants = room(vec![
            ("h", host("Host", Some("5"))),
            ("p1", voter("Alice", Some("8"))),
            ("p2", voter("Bob", None)),
        ]);
        let stats = calculate_statistics(&participants, false);
        assert_eq!(stats.average, None);
        assert_eq!(stats.median, None);
        assert_eq!(stats.min, None);
        assert_eq!(stats.max, None);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.total, 3);
        assert!(stats.distribution.is_empty());
    }

    #[test]
    fn revealed_stats_match_cast_votes() {
        let participants = room(vec![
            ("h", host("Host", Some("5"))),
            ("p1", voter("Alice", Some("8"))),
            ("p2", voter("Bob", None)),
        ]);
        let stats = calculate_statistics(&participants, true);
        assert_eq!(stats.average.as_deref(), Some("6.5"));
        assert_eq!(stats.median.as_deref(), Some("6.5"));
        assert_eq!(stats.min, Some(5.0));
        assert_eq!(stats.max, Some(8.0));
        assert_eq!(stats.count, 2);
        assert_eq!(stats.total, 3);
        assert_eq!(
            stats.distribution,
            vec![
                DistributionEntry {
                    value: "5".into(),
                    count: 1,
                    percentage: 50
                },
                DistributionEntry {
                    value: "8".into(),
                    count: 1,
                    percentage: 50
                },
            ]
        );
    }

    #[test]
    fn facilitators_are_invisible_to_every_number() {
        let participants = room(vec![
            ("p1", voter("Alice", Some("3"))),
            ("f1", facilitator("Fred", Some("13"))),
        ]);
        let stats = calculate_statistics(&participants, true);
        assert_eq!(stats.total, 1);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.max, Some(3.0));
        assert_eq!(stats.distribution.len(), 1);

        let progress = count_votes(&participants);
        assert_eq!(progress.total_participants, 1);
        assert_eq!(progress.votes_submitted, 1);
    }

    #[test]
    fn skippers_shrink_the_population_but_count_nowhere() {
        let participants = room(vec![
            ("p1", voter("Alice", Some("5"))),
            ("p2", voter("Bob", Some("SKIP"))),
            ("p3", voter("Carol", None)),
        ]);
        let stats = calculate_statistics(&participants, true);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.count, 1);

        let progress = count_votes(&participants);
        assert_eq!(progress.total_participants, 2);
        assert_eq!(progress.votes_submitted, 1);
    }

    #[test]
    fn question_mark_counts_but_stays_out_of_numeric_aggregates() {
        let participants = room(vec![
            ("p1", voter("Alice", Some("?"))),
            ("p2", voter("Bob", Some("8"))),
            ("p3", voter("Carol", Some("2"))),
        ]);
        let stats = calculate_statistics(&participants, true);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.average.as_deref(), Some("5.0"));
        assert_eq!(stats.median.as_deref(), Some("5.0"));
        assert_eq!(stats.min, Some(2.0));
        assert_eq!(stats.max, Some(8.0));
        // `?` sorts ahead of the numeric cards.
        let values: Vec<&str> = stats.distribution.iter().map(|d| d.value.as_str()).collect();
        assert_eq!(values, vec!["?", "2", "8"]);
    }

    #[test]
    fn only_question_marks_leaves_numeric_fields_empty() {
        let participants = room(vec![
            ("p1", voter("Alice", Some("?"))),
            ("p2", voter("Bob", Some("?"))),
        ]);
        let stats = calculate_statistics(&participants, true);
        assert_eq!(stats.average, None);
        assert_eq!(stats.min, None);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.distribution.len(), 1);
        assert_eq!(stats.distribution[0].percentage, 100);
    }

    #[test]
    fn average_sits_between_min_and_max() {
        let participants = room(vec![
            ("p1", voter("Alice", Some("1"))),
            ("p2", voter("Bob", Some("13"))),
            ("p3", voter("Carol", Some("21"))),
            ("p4", voter("Dave", Some("3"))),
        ]);
        let stats = calculate_statistics(&participants, true);
        let average: f64 = stats.average.unwrap().parse().unwrap();
        assert!(stats.min.unwrap() <= average && average <= stats.max.unwrap());
        let median: f64 = stats.median.unwrap().parse().unwrap();
        assert_eq!(median, 8.0);
    }

    #[test]
    fn odd_population_takes_the_middle_vote_as_median() {
        let participants = room(vec![
            ("p1", voter("Alice", Some("2"))),
            ("p2", voter("Bob", Some("5"))),
            ("p3", voter("Carol", Some("21"))),
        ]);
        let stats = calculate_statistics(&participants, true);
        assert_eq!(stats.median.as_deref(), Some("5.0"));
    }

    #[test]
    fn percentages_round_to_whole_numbers() {
        let participants = room(vec![
            ("p1", voter("Alice", Some("5"))),
            ("p2", voter("Bob", Some("5"))),
            ("p3", voter("Carol", Some("8"))),
        ]);
        let stats = calculate_statistics(&participants, true);
        let five = stats.distribution.iter().find(|d| d.value == "5").unwrap();
        let eight = stats.distribution.iter().find(|d| d.value == "8").unwrap();
        assert_eq!(five.percentage, 67);
        assert_eq!(eight.percentage, 33);
    }
}
