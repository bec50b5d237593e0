use crate::settings::RankDirection;
use crate::SessionId;
use rand::Rng;
use rand::seq::SliceRandom;
use std::cmp::Ordering;

/// One attendee's opinion of one session. `rating` is `None` when the
/// attendee left the cell blank, which is distinct from a rating of zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreferenceRecord {
    pub session: SessionId,
    pub rating: Option<f64>,
}

impl PreferenceRecord {
    pub fn new(session: SessionId, rating: Option<f64>) -> Self {
        Self { session, rating }
    }
}

/// How a preference list gets reordered before it is walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortPolicy {
    /// Best rating first, random among equals, unset last.
    Default,
    /// Emptiest session first, unset last within a tier, then by rating.
    Balanced,
    /// Emptiest session first, ratings ignored.
    SmallestSessionFirst,
}

/// Orders two optional ratings so that the better one comes first and unset
/// ratings come last.
fn compare_ratings(a: Option<f64>, b: Option<f64>, direction: RankDirection) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match direction {
            RankDirection::HighToLow => b.total_cmp(&a),
            RankDirection::LowToHigh => a.total_cmp(&b),
        },
    }
}

/// An attendee's ranked preferences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferenceList {
    records: Vec<PreferenceRecord>,
}

impl PreferenceList {
    pub fn new(records: Vec<PreferenceRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[PreferenceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: PreferenceRecord) {
        self.records.push(record);
    }

    pub fn for_session(&self, session: SessionId) -> Option<&PreferenceRecord> {
        self.records.iter().find(|record| record.session == session)
    }

    /// True when nothing in the list carries a rating, i.e. the attendee
    /// never filled in the form.
    pub fn has_no_usable_data(&self) -> bool {
        self.records.iter().all(|record| record.rating.is_none())
    }

    /// Reorders the list in place.
    ///
    /// Ties are broken by shuffling before a stable sort, so every call
    /// draws a fresh order for equal records. `enrollment` reports the
    /// current number of attendees in a session.
    pub fn sort<R, F>(&mut self, policy: SortPolicy, direction: RankDirection, enrollment: F, rng: &mut R)
    where
        R: Rng + ?Sized,
        F: Fn(SessionId) -> usize,
    {
        match policy {
            SortPolicy::Default => {
                self.records.shuffle(rng);
                self.records
                    .sort_by(|a, b| compare_ratings(a.rating, b.rating, direction));
            }
            SortPolicy::Balanced => {
                self.records.shuffle(rng);
                self.records.sort_by(|a, b| {
                    enrollment(a.session)
                        .cmp(&enrollment(b.session))
                        .then_with(|| compare_ratings(a.rating, b.rating, direction))
                });
            }
            SortPolicy::SmallestSessionFirst => {
                self.records
                    .sort_by_key(|record| enrollment(record.session));
            }
        }
    }

    /// The `rank`-th best rated record regardless of the list's current
    /// order. Unset ratings rank after every set one.
    pub fn highest(&self, rank: usize, direction: RankDirection) -> Option<&PreferenceRecord> {
        let mut ranked: Vec<&PreferenceRecord> = self.records.iter().collect();
        ranked.sort_by(|a, b| compare_ratings(a.rating, b.rating, direction));
        ranked.get(rank).copied()
    }

    /// True when the attendee's single best rating is blank or zero.
    pub fn is_no_response(&self, direction: RankDirection) -> bool {
        match self.highest(0, direction) {
            Some(record) => record.rating.is_none_or(|rating| rating == 0.0),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn list(ratings: &[Option<f64>]) -> PreferenceList {
        PreferenceList::new(
            ratings
                .iter()
                .enumerate()
                .map(|(i, &rating)| PreferenceRecord::new(SessionId(i), rating))
                .collect(),
        )
    }

    fn order(list: &PreferenceList) -> Vec<usize> {
        list.records().iter().map(|r| r.session.0).collect()
    }

    #[test]
    fn test_default_sort_high_to_low_puts_unset_last() {
        let mut prefs = list(&[Some(2.0), None, Some(5.0), Some(3.0)]);
        let mut rng = StdRng::seed_from_u64(7);
        prefs.sort(SortPolicy::Default, RankDirection::HighToLow, |_| 0, &mut rng);
        assert_eq!(order(&prefs), vec![2, 3, 0, 1]);
    }

    #[test]
    fn test_default_sort_low_to_high() {
        let mut prefs = list(&[Some(2.0), None, Some(5.0), Some(1.0)]);
        let mut rng = StdRng::seed_from_u64(7);
        prefs.sort(SortPolicy::Default, RankDirection::LowToHigh, |_| 0, &mut rng);
        assert_eq!(order(&prefs), vec![3, 0, 2, 1]);
    }

    #[test]
    fn test_default_sort_rerandomizes_ties() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut firsts = std::collections::HashSet::new();
        for _ in 0..64 {
            let mut prefs = list(&[Some(4.0), Some(4.0), Some(4.0), Some(1.0)]);
            prefs.sort(SortPolicy::Default, RankDirection::HighToLow, |_| 0, &mut rng);
            assert_eq!(prefs.records()[3].session, SessionId(3));
            firsts.insert(prefs.records()[0].session);
        }
        assert!(firsts.len() > 1, "ties never changed order");
    }

    #[test]
    fn test_balanced_sort_prefers_emptier_sessions() {
        let mut prefs = list(&[Some(5.0), Some(1.0), None, Some(3.0)]);
        let enrollment = |s: SessionId| match s.0 {
            0 => 4,
            1 => 0,
            2 => 0,
            _ => 2,
        };
        let mut rng = StdRng::seed_from_u64(3);
        prefs.sort(SortPolicy::Balanced, RankDirection::HighToLow, enrollment, &mut rng);
        // session 2 shares the empty tier with 1 but has no rating
        assert_eq!(order(&prefs), vec![1, 2, 3, 0]);
    }

    #[test]
    fn test_smallest_first_ignores_ratings() {
        let mut prefs = list(&[Some(5.0), Some(1.0), Some(3.0)]);
        let mut rng = StdRng::seed_from_u64(3);
        prefs.sort(SortPolicy::SmallestSessionFirst, RankDirection::HighToLow, |s| 10 - s.0, &mut rng);
        assert_eq!(order(&prefs), vec![2, 1, 0]);
    }

    #[test]
    fn test_highest_ignores_current_order() {
        let prefs = list(&[Some(1.0), None, Some(4.0), Some(3.0)]);
        assert_eq!(prefs.highest(0, RankDirection::HighToLow).map(|r| r.session), Some(SessionId(2)));
        assert_eq!(prefs.highest(1, RankDirection::HighToLow).map(|r| r.session), Some(SessionId(3)));
        assert_eq!(prefs.highest(3, RankDirection::HighToLow).map(|r| r.session), Some(SessionId(1)));
        assert!(prefs.highest(4, RankDirection::HighToLow).is_none());
    }

    #[test]
    fn test_no_response_detection() {
        assert!(list(&[None, None]).is_no_response(RankDirection::HighToLow));
        assert!(list(&[Some(0.0), Some(0.0)]).is_no_response(RankDirection::HighToLow));
        assert!(!list(&[Some(0.0), Some(2.0)]).is_no_response(RankDirection::HighToLow));
        assert!(!PreferenceList::default().is_no_response(RankDirection::HighToLow));

        assert!(list(&[None, None]).has_no_usable_data());
        assert!(PreferenceList::default().has_no_usable_data());
        assert!(!list(&[None, Some(0.0)]).has_no_usable_data());
    }
}
