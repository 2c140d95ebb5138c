//! Lifespan / reign overlap.
//!
//! A person lived under a monarch when the closed interval
//! `[born-01-01, died-12-31]` intersects the reign. Touching at a single
//! day counts, so someone born in the year a reign ended lived under it.
//! Persons still alive are evaluated up to `today`, which callers pass in
//! explicitly so results stay reproducible.

use chrono::{Local, NaiveDate};
use lineage_types::{Monarch, Person, LIVING_SENTINEL};
use serde::Serialize;
use tracing::warn;

// ── Dates ────────────────────────────────────────────────────────────

/// The current local date, used as the upper bound for living persons.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Start,
    End,
}

/// Parse "YYYY", "YYYY-MM" or "YYYY-MM-DD" (an ISO time suffix is ignored).
/// Partial dates widen towards the given edge of the interval.
fn parse_bound(raw: &str, edge: Edge) -> Option<NaiveDate> {
    let raw = raw.trim();
    let raw = raw.split_once('T').map_or(raw, |(date, _)| date);
    let mut parts = raw.splitn(3, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: Option<u32> = parts.next().map(str::parse).transpose().ok()?;
    let day: Option<u32> = parts.next().map(str::parse).transpose().ok()?;

    match (month, day, edge) {
        (Some(m), Some(d), _) => NaiveDate::from_ymd_opt(year, m, d),
        (Some(m), None, Edge::Start) => NaiveDate::from_ymd_opt(year, m, 1),
        (Some(m), None, Edge::End) => last_day_of_month(year, m),
        (None, _, Edge::Start) => NaiveDate::from_ymd_opt(year, 1, 1),
        (None, _, Edge::End) => NaiveDate::from_ymd_opt(year, 12, 31),
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (y, m) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(y, m, 1)?.pred_opt()
}

// ── Intervals ────────────────────────────────────────────────────────

/// A closed date interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifespan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Lifespan {
    /// `None` without a birth year. A missing or sentinel death year
    /// extends the lifespan to `today`.
    pub fn from_years(born: Option<i32>, died: Option<i32>, today: NaiveDate) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(born?, 1, 1)?;
        let end = match died {
            Some(d) if d != LIVING_SENTINEL => NaiveDate::from_ymd_opt(d, 12, 31)?,
            _ => today,
        };
        Some(Lifespan { start, end })
    }

    pub fn of(person: &Person, today: NaiveDate) -> Option<Self> {
        Self::from_years(person.born, person.died, today)
    }
}

/// A monarch's reign as a closed date interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reign {
    pub id: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl Reign {
    pub fn new(id: &str, from: NaiveDate, to: NaiveDate) -> Self {
        Reign {
            id: id.to_string(),
            from,
            to,
        }
    }

    /// `None` when the reign dates cannot be parsed. An ongoing reign
    /// (no `reign_to`) runs until `today`.
    pub fn from_monarch(monarch: &Monarch, today: NaiveDate) -> Option<Self> {
        let from = parse_bound(&monarch.reign_from, Edge::Start)?;
        let to = match &monarch.reign_to {
            Some(raw) => parse_bound(raw, Edge::End)?,
            None => today,
        };
        Some(Reign {
            id: monarch.id.clone(),
            from,
            to,
        })
    }

    /// Closed-interval intersection test.
    pub fn overlaps(&self, lifespan: &Lifespan) -> bool {
        self.from <= lifespan.end && self.to >= lifespan.start
    }
}

/// Reign calendar for a monarch registry, in registry order.
/// Monarchs with unparseable dates are skipped.
pub fn reign_calendar(monarchs: &[Monarch], today: NaiveDate) -> Vec<Reign> {
    monarchs
        .iter()
        .filter_map(|m| {
            let reign = Reign::from_monarch(m, today);
            if reign.is_none() {
                warn!(monarch = %m.id, from = %m.reign_from, to = ?m.reign_to, "unparseable reign dates");
            }
            reign
        })
        .collect()
}

// ── Overlap queries ──────────────────────────────────────────────────

/// Ids of the reigns overlapping the given lifespan, in `reigns` order.
/// Empty when the birth year is unknown.
pub fn overlapping_reign_ids(
    born: Option<i32>,
    died: Option<i32>,
    reigns: &[Reign],
    today: NaiveDate,
) -> Vec<String> {
    let Some(lifespan) = Lifespan::from_years(born, died, today) else {
        return Vec::new();
    };
    reigns
        .iter()
        .filter(|r| r.overlaps(&lifespan))
        .map(|r| r.id.clone())
        .collect()
}

/// Monarchs worth offering in a picker for someone with these years.
pub fn plausible_monarchs<'a>(
    born: Option<i32>,
    died: Option<i32>,
    monarchs: &'a [Monarch],
    today: NaiveDate,
) -> Vec<&'a Monarch> {
    let Some(lifespan) = Lifespan::from_years(born, died, today) else {
        return Vec::new();
    };
    monarchs
        .iter()
        .filter(|m| Reign::from_monarch(m, today).is_some_and(|r| r.overlaps(&lifespan)))
        .collect()
}

/// Monarchs who reigned during this person's life.
pub fn monarchs_for_person<'a>(
    person: &Person,
    monarchs: &'a [Monarch],
    today: NaiveDate,
) -> Vec<&'a Monarch> {
    plausible_monarchs(person.born, person.died, monarchs, today)
}

// ── Bulk audit ───────────────────────────────────────────────────────

/// Difference between a person's stored monarch ids and the reigns
/// that actually overlap their lifespan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub external_id: String,
    pub name: String,
    pub expected: Vec<String>,
    pub stored: Vec<String>,
    /// Overlapping reigns not linked to the person.
    pub missing: Vec<String>,
    /// Linked monarchs whose reign does not overlap the lifespan.
    pub unexpected: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapAudit {
    pub checked: usize,
    pub skipped_without_birth: usize,
    pub consistent: usize,
    pub entries: Vec<AuditEntry>,
}

/// Dry-run check of every person's `monarch_ids` against the reign calendar.
pub fn audit_monarch_ids(people: &[Person], monarchs: &[Monarch], today: NaiveDate) -> OverlapAudit {
    let reigns = reign_calendar(monarchs, today);
    let mut audit = OverlapAudit::default();

    for person in people {
        if person.born.is_none() {
            audit.skipped_without_birth += 1;
            continue;
        }
        audit.checked += 1;

        let expected = overlapping_reign_ids(person.born, person.died, &reigns, today);
        let missing: Vec<String> = expected
            .iter()
            .filter(|id| !person.monarch_ids.contains(*id))
            .cloned()
            .collect();
        let unexpected: Vec<String> = person
            .monarch_ids
            .iter()
            .filter(|id| !expected.contains(*id))
            .cloned()
            .collect();

        if missing.is_empty() && unexpected.is_empty() {
            audit.consistent += 1;
            continue;
        }
        audit.entries.push(AuditEntry {
            external_id: person.external_id.clone(),
            name: person.name.clone(),
            expected,
            stored: person.monarch_ids.clone(),
            missing,
            unexpected,
        });
    }
    audit
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixed_today() -> NaiveDate {
        date(2024, 6, 1)
    }

    fn vasa_era() -> Vec<Monarch> {
        vec![
            Monarch::new("gustav-i-vasa", "Gustav I Vasa", "1523", "1560"),
            Monarch::new("erik-xiv", "Erik XIV", "1560", "1568"),
            Monarch::new("johan-iii", "Johan III", "1568", "1592"),
            Monarch::new("sigismund", "Sigismund", "1592", "1599"),
            Monarch::new("karl-ix", "Karl IX", "1599", "1611"),
            Monarch::new("gustav-ii-adolf", "Gustav II Adolf", "1611", "1632"),
        ]
    }

    #[test]
    fn test_parse_bound_partial_dates() {
        assert_eq!(parse_bound("1523", Edge::Start), Some(date(1523, 1, 1)));
        assert_eq!(parse_bound("1523", Edge::End), Some(date(1523, 12, 31)));
        assert_eq!(parse_bound("1600-02", Edge::End), Some(date(1600, 2, 29)));
        assert_eq!(parse_bound("1523-06-06", Edge::End), Some(date(1523, 6, 6)));
        assert_eq!(parse_bound("1523-06-06T00:00:00Z", Edge::Start), Some(date(1523, 6, 6)));
        assert_eq!(parse_bound("sometime", Edge::Start), None);
        assert_eq!(parse_bound("1523-13", Edge::Start), None);
    }

    #[test]
    fn test_no_birth_year_means_no_overlap() {
        let reigns = reign_calendar(&vasa_era(), fixed_today());
        assert!(overlapping_reign_ids(None, Some(1600), &reigns, fixed_today()).is_empty());
    }

    #[test]
    fn test_boundary_year_counts_on_both_sides() {
        let reigns = vec![
            Reign::new("gustav-i-vasa", date(1523, 1, 1), date(1560, 12, 31)),
            Reign::new("erik-xiv", date(1560, 1, 1), date(1568, 12, 31)),
        ];
        assert_eq!(
            overlapping_reign_ids(Some(1560), Some(1560), &reigns, fixed_today()),
            vec!["gustav-i-vasa", "erik-xiv"]
        );
    }

    #[test]
    fn test_long_life_spans_six_reigns() {
        let reigns = reign_calendar(&vasa_era(), fixed_today());
        let ids = overlapping_reign_ids(Some(1545), Some(1625), &reigns, fixed_today());
        assert_eq!(
            ids,
            vec![
                "gustav-i-vasa",
                "erik-xiv",
                "johan-iii",
                "sigismund",
                "karl-ix",
                "gustav-ii-adolf"
            ]
        );
    }

    #[test]
    fn test_output_follows_input_order() {
        let mut monarchs = vasa_era();
        monarchs.reverse();
        let reigns = reign_calendar(&monarchs, fixed_today());
        let ids = overlapping_reign_ids(Some(1565), Some(1570), &reigns, fixed_today());
        assert_eq!(ids, vec!["johan-iii", "erik-xiv"]);
    }

    #[test]
    fn test_living_person_runs_until_today() {
        let monarchs = vec![
            Monarch::new("carl-xvi-gustaf", "Carl XVI Gustaf", "1973-09-15", "2100"),
            Monarch::new("gustaf-vi-adolf", "Gustaf VI Adolf", "1950", "1973-09-15"),
        ];
        let reigns = reign_calendar(&monarchs, fixed_today());
        let living = overlapping_reign_ids(Some(1980), Some(LIVING_SENTINEL), &reigns, fixed_today());
        assert_eq!(living, vec!["carl-xvi-gustaf"]);
        let unknown = overlapping_reign_ids(Some(1980), None, &reigns, fixed_today());
        assert_eq!(unknown, living);
        // Evaluated in 1975 the open lifespan ends on that date
        let early = overlapping_reign_ids(Some(1960), None, &reigns, date(1975, 1, 1));
        assert_eq!(early, vec!["carl-xvi-gustaf", "gustaf-vi-adolf"]);
    }

    #[test]
    fn test_ongoing_reign_without_end() {
        let mut m = Monarch::new("current", "Current", "2000", "2000");
        m.reign_to = None;
        let reign = Reign::from_monarch(&m, fixed_today()).unwrap();
        assert_eq!(reign.to, fixed_today());
    }

    #[test]
    fn test_unparseable_monarch_is_skipped() {
        let mut monarchs = vasa_era();
        monarchs.push(Monarch::new("mystery", "Mystery", "unknown", "1600"));
        assert_eq!(reign_calendar(&monarchs, fixed_today()).len(), 6);
        let picked = plausible_monarchs(Some(1590), Some(1591), &monarchs, fixed_today());
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].id, "johan-iii");
    }

    #[test]
    fn test_monarchs_for_person() {
        let monarchs = vasa_era();
        let p = Person::new("0.1", "Hans").with_years(Some(1600), Some(1612));
        let ids: Vec<&str> = monarchs_for_person(&p, &monarchs, fixed_today())
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, vec!["karl-ix", "gustav-ii-adolf"]);
    }

    #[test]
    fn test_audit_reports_missing_and_unexpected() {
        let monarchs = vasa_era();
        let mut ok = Person::new("0", "Ok").with_years(Some(1600), Some(1610));
        ok.monarch_ids = vec!["karl-ix".into()];
        let mut off = Person::new("0.1", "Off").with_years(Some(1600), Some(1612));
        off.monarch_ids = vec!["erik-xiv".into(), "karl-ix".into()];
        let unborn = Person::new("0.2", "Unknown");

        let audit = audit_monarch_ids(&[ok, off, unborn], &monarchs, fixed_today());
        assert_eq!(audit.checked, 2);
        assert_eq!(audit.skipped_without_birth, 1);
        assert_eq!(audit.consistent, 1);
        assert_eq!(audit.entries.len(), 1);
        assert_eq!(audit.entries[0].missing, vec!["gustav-ii-adolf"]);
        assert_eq!(audit.entries[0].unexpected, vec!["erik-xiv"]);
    }
}
