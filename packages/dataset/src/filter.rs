//! Filter engine.

use crime_route_incident_models::{CrimeRecord, FilterCriteria};

/// Returns the records that satisfy every predicate in `criteria`, in
/// input order.
///
/// Pure and side-effect free. Takes any iterator of borrowed records, so a
/// filtered view can be filtered again without copying.
#[must_use]
pub fn filter<'a, I>(records: I, criteria: &FilterCriteria) -> Vec<&'a CrimeRecord>
where
    I: IntoIterator<Item = &'a CrimeRecord>,
{
    records
        .into_iter()
        .filter(|record| criteria.matches(record))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crime_route_incident_models::{ArrestMade, DateRange};

    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    fn record(id: usize, crime_type: &str, d: u32, status: &str) -> CrimeRecord {
        CrimeRecord {
            id,
            crime_type: crime_type.to_string(),
            date: day(d),
            location: "Chennai".to_string(),
            latitude: 13.05,
            longitude: 80.25,
            suspect_gender: "Male".to_string(),
            suspect_age: 30,
            victim_gender: "Male".to_string(),
            victim_age: 30,
            arrest_made: ArrestMade::Yes,
            case_status: status.to_string(),
            description: String::new(),
        }
    }

    fn sample() -> Vec<CrimeRecord> {
        vec![
            record(0, "Theft", 1, "Open"),
            record(1, "Assault", 2, "Closed"),
            record(2, "Theft", 3, "Open"),
            record(3, "Theft", 2, "Closed"),
        ]
    }

    fn all_statuses() -> [&'static str; 2] {
        ["Open", "Closed"]
    }

    #[test]
    fn keeps_theft_records_inside_range() {
        let records = sample();
        let criteria =
            FilterCriteria::new(["Theft"], DateRange::new(day(1), day(2)), all_statuses());

        let ids: Vec<usize> = filter(&records, &criteria).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 3]);
    }

    #[test]
    fn result_only_contains_matching_records() {
        let records = sample();
        let criteria = FilterCriteria::new(
            ["Theft", "Assault"],
            DateRange::new(day(2), day(3)),
            ["Closed"],
        );

        let result = filter(&records, &criteria);
        assert!(result.len() <= records.len());
        for r in &result {
            assert!(criteria.crime_types.contains(&r.crime_type));
            assert!(criteria.date_range.contains(r.date));
            assert!(criteria.case_statuses.contains(&r.case_status));
        }
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn filtering_is_idempotent() {
        let records = sample();
        let criteria =
            FilterCriteria::new(["Theft"], DateRange::new(day(1), day(3)), ["Open"]);

        let once = filter(&records, &criteria);
        let twice = filter(once.iter().copied(), &criteria);
        assert_eq!(once, twice);
    }

    #[test]
    fn preserves_input_order() {
        let mut records = sample();
        records.reverse();
        let criteria = FilterCriteria::new(
            ["Theft", "Assault"],
            DateRange::new(day(1), day(3)),
            all_statuses(),
        );

        let ids: Vec<usize> = filter(&records, &criteria).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1, 0]);
    }

    #[test]
    fn empty_status_selection_matches_nothing() {
        let records = sample();
        let criteria = FilterCriteria::new(
            ["Theft", "Assault"],
            DateRange::new(day(1), day(3)),
            Vec::<String>::new(),
        );
        assert!(filter(&records, &criteria).is_empty());
    }
}
