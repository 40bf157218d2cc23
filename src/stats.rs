use crate::models::LeagueBook;
use chrono::Duration;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct TbaCounts {
    pub valid: u64,
    pub invalid: u64,
    pub pending: u64,
}

#[derive(Debug, Serialize)]
pub struct WeeklyRevenuePoint {
    pub week: u32,
    pub date: String,
    pub collected: f64,
}

#[derive(Debug, Serialize)]
pub struct LeagueStatsResponse {
    pub league: String,
    pub tba: TbaCounts,
    pub weekly_revenue: Vec<WeeklyRevenuePoint>,
}

/// Dashboard figures for one league: TBA registration counts across the whole
/// bowler roll, and what was collected per week.
pub fn build_league_stats(book: &LeagueBook, league_id: u64) -> Option<LeagueStatsResponse> {
    let league = book.leagues.get(&league_id)?;

    let mut tba = TbaCounts {
        valid: 0,
        invalid: 0,
        pending: 0,
    };
    for bowler in book.bowlers.values() {
        match bowler.tba_status.as_str() {
            "valid" => tba.valid += 1,
            "invalid" => tba.invalid += 1,
            _ => tba.pending += 1,
        }
    }

    let mut weekly_revenue = Vec::with_capacity(league.weeks as usize);
    for week in 1..=league.weeks {
        let collected = book
            .attendance
            .iter()
            .filter(|record| record.league_id == league_id && record.week_number == week)
            .map(|record| record.amount_paid)
            .sum();
        let date = league.start_date + Duration::weeks(i64::from(week) - 1);
        weekly_revenue.push(WeeklyRevenuePoint {
            week,
            date: date.to_string(),
            collected,
        });
    }

    Some(LeagueStatsResponse {
        league: league.name.clone(),
        tba,
        weekly_revenue,
    })
}
