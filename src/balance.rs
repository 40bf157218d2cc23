use crate::models::{CellStatus, LeagueBook};

/// What one bowler owes in one league: missed weeks owe the social fee plus
/// the fine (when the league fines), fixed weeks owe the social fee only,
/// paid weeks owe nothing; every recorded payment is subtracted. Can go
/// negative on overpayment; the display layer clamps that to `$0.00`.
pub fn bowler_balance(book: &LeagueBook, bowler_id: u64, league_id: u64) -> f64 {
    let Some(league) = book.leagues.get(&league_id) else {
        return 0.0;
    };

    let mut owed = 0.0;
    let mut paid = 0.0;
    for record in book
        .attendance
        .iter()
        .filter(|record| record.bowler_id == bowler_id && record.league_id == league_id)
    {
        match record.status {
            CellStatus::Missed => {
                owed += league.social_fee;
                if league.has_fines {
                    owed += league.fine_amount;
                }
            }
            CellStatus::Fixed => {
                owed += league.social_fee;
            }
            CellStatus::Paid | CellStatus::None => {}
        }
        paid += record.amount_paid;
    }

    owed - paid
}
