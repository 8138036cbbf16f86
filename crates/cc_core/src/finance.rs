//! Club finance: fee collection summaries and the withdrawal ledger.
//!
//! Finance only ever reads completed matches. Fee edits happen in the fee
//! collaborator and never feed back into scoring.

use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{FeeStatus, Match, MatchStatus, Withdrawal};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinancialSummary {
    pub total_collected: f64,
    pub total_withdrawn: f64,
    pub balance: f64,
}

/// Per-match fee collection status for the fee collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchFeeBreakdown {
    pub paid: usize,
    pub unpaid: usize,
    pub exempt: usize,
}

impl MatchFeeBreakdown {
    pub fn collected(&self, fee: f64) -> f64 {
        self.paid as f64 * fee
    }
}

/// Fees actually collected for one match: paid count times the match fee.
pub fn collected_for_match(match_rec: &Match) -> f64 {
    let paid = match_rec.fees.values().filter(|s| **s == FeeStatus::Paid).count();
    paid as f64 * match_rec.effective_fee()
}

pub fn fee_breakdown(match_rec: &Match) -> MatchFeeBreakdown {
    let mut breakdown = MatchFeeBreakdown { paid: 0, unpaid: 0, exempt: 0 };
    for status in match_rec.fees.values() {
        match status {
            FeeStatus::Paid => breakdown.paid += 1,
            FeeStatus::Unpaid => breakdown.unpaid += 1,
            FeeStatus::Exempt => breakdown.exempt += 1,
        }
    }
    breakdown
}

/// Totals across every completed match and the whole withdrawal ledger.
pub fn financial_summary(matches: &[Match], withdrawals: &[Withdrawal]) -> FinancialSummary {
    let total_collected: f64 = matches
        .iter()
        .filter(|m| m.status == MatchStatus::Completed)
        .map(collected_for_match)
        .sum();
    let total_withdrawn: f64 = withdrawals.iter().map(|w| w.amount).sum();
    FinancialSummary {
        total_collected,
        total_withdrawn,
        balance: total_collected - total_withdrawn,
    }
}

/// Withdrawal details as entered by the treasurer.
#[derive(Debug, Clone)]
pub struct WithdrawalRequest {
    pub amount: f64,
    pub reason: String,
    /// ISO `YYYY-MM-DD`
    pub date: String,
    pub person_name: Option<String>,
}

/// Record a withdrawal against the current balance.
///
/// A withdrawal exceeding the balance is a logical impossibility: the
/// request is rejected and the ledger is untouched. The ledger stays
/// sorted newest first.
pub fn record_withdrawal(
    matches: &[Match],
    withdrawals: &mut Vec<Withdrawal>,
    request: WithdrawalRequest,
) -> Result<Withdrawal, CoreError> {
    if !(request.amount > 0.0) {
        return Err(CoreError::InvalidParameter(
            "withdrawal amount must be positive".to_string(),
        ));
    }
    if request.reason.trim().is_empty() || request.date.trim().is_empty() {
        return Err(CoreError::Validation("withdrawal reason and date are required".to_string()));
    }

    let balance = financial_summary(matches, withdrawals).balance;
    if request.amount > balance {
        return Err(CoreError::InsufficientBalance {
            requested: request.amount,
            available: balance,
        });
    }

    let withdrawal = Withdrawal {
        id: Uuid::new_v4().to_string(),
        amount: request.amount,
        reason: request.reason,
        date: request.date,
        person_name: request.person_name,
    };
    log::info!("withdrawal of {:.2} recorded ({})", withdrawal.amount, withdrawal.reason);

    withdrawals.push(withdrawal.clone());
    withdrawals.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(withdrawal)
}
