use crate::models::{CellKey, CellStatus, UpdateRequest, UpdateResponse};
use std::collections::BTreeMap;

/// User gestures that drive the per-cell status cycle. The fix affordance and
/// edit mode have their own entry points on [`GridController`] because both
/// carry extra state (the affordance flag, the typed amount).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Primary (left) click.
    Primary,
    /// Secondary (context-menu) click.
    Secondary,
}

/// The status transition table. Secondary always lands on `missed`; primary
/// cycles `none/missed -> paid -> none`, with `fixed` falling to the default
/// `paid` rule.
pub fn next_status(current: CellStatus, trigger: Trigger) -> CellStatus {
    match trigger {
        Trigger::Secondary => CellStatus::Missed,
        Trigger::Primary => match current {
            CellStatus::None | CellStatus::Missed => CellStatus::Paid,
            CellStatus::Paid => CellStatus::None,
            CellStatus::Fixed => CellStatus::Paid,
        },
    }
}

/// Resolve an edit-mode commit. Anything that does not parse to a positive
/// amount (empty, garbage, zero, negative) lands on `none` with `0.00` stored.
pub fn commit_amount(raw: &str) -> (CellStatus, f64) {
    let parsed = raw.trim().parse::<f64>().unwrap_or(0.0);
    if parsed > 0.0 {
        (CellStatus::Paid, parsed)
    } else {
        (CellStatus::None, 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellIcon {
    Check,
    Cross,
    Wrench,
}

/// Fixed visual representation of a status: at most one icon and at most one
/// status class. A cell with no icon renders the `-` placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellView {
    pub icon: Option<CellIcon>,
    pub css_class: Option<&'static str>,
}

pub fn cell_view(status: CellStatus) -> CellView {
    match status {
        CellStatus::Paid => CellView {
            icon: Some(CellIcon::Check),
            css_class: Some("paid"),
        },
        CellStatus::Missed => CellView {
            icon: Some(CellIcon::Cross),
            css_class: Some("missed"),
        },
        CellStatus::Fixed => CellView {
            icon: Some(CellIcon::Wrench),
            css_class: Some("fixed"),
        },
        CellStatus::None => CellView {
            icon: None,
            css_class: None,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceTone {
    /// Money owing, rendered red.
    Owing,
    /// Settled (or overpaid), rendered green.
    Clear,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BalanceView {
    pub text: String,
    pub tone: BalanceTone,
}

/// Balance display contract: positive balances show red currency text, anything
/// else collapses to the green `$0.00`.
pub fn balance_view(balance: f64) -> BalanceView {
    if balance > 0.0 {
        BalanceView {
            text: format!("${balance:.2}"),
            tone: BalanceTone::Owing,
        }
    } else {
        BalanceView {
            text: "$0.00".to_string(),
            tone: BalanceTone::Clear,
        }
    }
}

/// How balance responses for overlapping in-flight updates are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderingPolicy {
    /// Last response to arrive wins, regardless of issue order. This is what
    /// the grid has always done.
    #[default]
    ArrivalOrder,
    /// Responses to updates issued before the newest one already reconciled
    /// for that bowler are dropped as stale.
    IssueOrder,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellState {
    pub status: CellStatus,
    pub amount: f64,
    pub fix_offered: bool,
}

impl Default for CellState {
    fn default() -> Self {
        Self {
            status: CellStatus::None,
            amount: 0.0,
            fix_offered: false,
        }
    }
}

/// An optimistic transition: the view to draw now, and the update to send.
#[derive(Debug, Clone)]
pub struct Mutation {
    pub key: CellKey,
    pub seq: u64,
    pub view: CellView,
    pub request: UpdateRequest,
}

/// What the caller should do with a settled update.
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    /// Refresh the bowler's balance display.
    Balance(BalanceView),
    /// Surface a blocking alert; the optimistic view stays as drawn.
    Alert(&'static str),
    /// Response arrived out of issue order and was dropped.
    Stale,
    /// Nothing to do (no balance in the response).
    None,
}

pub const UPDATE_FAILED_ALERT: &str = "Failed to update attendance. Please try again.";

/// Owns the view state of every attendance cell and the per-bowler balance
/// displays. Cells are keyed by `(bowler, league, week)`; the DOM (or any
/// other surface) holds only the key, never the state.
#[derive(Debug, Default)]
pub struct GridController {
    cells: BTreeMap<CellKey, CellState>,
    balances: BTreeMap<u64, f64>,
    applied_seq: BTreeMap<u64, u64>,
    ordering: OrderingPolicy,
    next_seq: u64,
}

impl GridController {
    pub fn new(ordering: OrderingPolicy) -> Self {
        Self {
            ordering,
            ..Self::default()
        }
    }

    /// Adopt a cell as rendered by the server. Missing cells default to
    /// `none` / `0.00`, so only populated ones need seeding.
    pub fn seed_cell(&mut self, key: CellKey, status: CellStatus, amount: f64) {
        self.cells.insert(
            key,
            CellState {
                status,
                amount,
                fix_offered: false,
            },
        );
    }

    pub fn cell(&self, key: CellKey) -> CellState {
        self.cells.get(&key).copied().unwrap_or_default()
    }

    pub fn balance(&self, bowler_id: u64) -> Option<f64> {
        self.balances.get(&bowler_id).copied()
    }

    pub fn primary_click(&mut self, key: CellKey) -> Mutation {
        let next = next_status(self.cell(key).status, Trigger::Primary);
        self.apply(key, next, None)
    }

    /// Secondary click forces `missed` and attaches the fix affordance. A
    /// repeat gesture redraws but never stacks a second affordance.
    pub fn secondary_click(&mut self, key: CellKey) -> Mutation {
        let next = next_status(self.cell(key).status, Trigger::Secondary);
        let mutation = self.apply(key, next, None);
        if let Some(state) = self.cells.get_mut(&key) {
            state.fix_offered = true;
        }
        mutation
    }

    pub fn fix_offered(&self, key: CellKey) -> bool {
        self.cell(key).fix_offered
    }

    /// Activate the fix affordance. A single transition to `fixed`; the
    /// affordance is consumed and the cell's own click path is not run.
    pub fn fix(&mut self, key: CellKey) -> Option<Mutation> {
        if !self.fix_offered(key) {
            return None;
        }
        Some(self.apply(key, CellStatus::Fixed, None))
    }

    /// Value pre-filled into the edit-mode input.
    pub fn edit_prefill(&self, key: CellKey) -> String {
        format!("{:.2}", self.cell(key).amount)
    }

    /// Commit edit mode with whatever the user typed.
    pub fn commit_edit(&mut self, key: CellKey, raw: &str) -> Mutation {
        let (status, amount) = commit_amount(raw);
        let mutation = self.apply(key, status, Some(amount));
        if let Some(state) = self.cells.get_mut(&key) {
            state.amount = amount;
        }
        mutation
    }

    fn apply(&mut self, key: CellKey, status: CellStatus, amount: Option<f64>) -> Mutation {
        let state = self.cells.entry(key).or_default();
        state.status = status;
        // Any redraw clears the affordance; secondary re-attaches it.
        state.fix_offered = false;

        self.next_seq += 1;
        Mutation {
            key,
            seq: self.next_seq,
            view: cell_view(status),
            request: UpdateRequest {
                bowler_id: key.bowler_id,
                league_id: key.league_id,
                week_number: key.week_number,
                status,
                amount,
            },
        }
    }

    /// Reconcile a successful server response for the update stamped `seq`.
    pub fn reconcile_success(
        &mut self,
        bowler_id: u64,
        seq: u64,
        response: &UpdateResponse,
    ) -> Reaction {
        let Some(balance) = response.balance else {
            return Reaction::None;
        };

        if self.ordering == OrderingPolicy::IssueOrder {
            let newest = self.applied_seq.get(&bowler_id).copied().unwrap_or(0);
            if seq < newest {
                return Reaction::Stale;
            }
        }

        self.applied_seq.insert(bowler_id, seq);
        self.balances.insert(bowler_id, balance);
        Reaction::Balance(balance_view(balance))
    }

    /// Any transport or HTTP failure surfaces the same alert; the optimistic
    /// view is left as drawn.
    pub fn reconcile_failure(&self) -> Reaction {
        Reaction::Alert(UPDATE_FAILED_ALERT)
    }
}
