use std::collections::{BTreeMap, HashSet};

use crate::contract::PLACEHOLDER;
use crate::model::{JoinReport, PaymentRecord, PortfolioRecord, ReconciledRecord, ReconciledSet, Totals};

/// Inner-join payments to portfolio rows by contract, in payment order.
///
/// A contract listed more than once on either side yields one row per
/// (payment, portfolio) pair. Placeholder contracts never match. Contracts
/// that drop out are listed in the [`JoinReport`].
pub fn reconcile(
    payments: &[PaymentRecord],
    portfolio: &[PortfolioRecord],
    portfolio_name: &str,
) -> (ReconciledSet, JoinReport) {
    let mut by_contract: BTreeMap<&str, Vec<&PortfolioRecord>> = BTreeMap::new();
    for rec in portfolio {
        if rec.contract == PLACEHOLDER {
            continue;
        }
        by_contract.entry(rec.contract.as_str()).or_default().push(rec);
    }

    let mut rows = Vec::new();
    let mut matched: HashSet<&str> = HashSet::new();
    let mut payment_only = Vec::new();

    for pay in payments {
        match by_contract.get(pay.contract.as_str()) {
            Some(port_rows) if pay.contract != PLACEHOLDER => {
                matched.insert(pay.contract.as_str());
                for port in port_rows {
                    rows.push(ReconciledRecord {
                        contract: pay.contract.clone(),
                        customer_name: pay.customer_name.clone(),
                        transaction_type: pay.transaction_type.clone(),
                        amount_cents: pay.amount_cents,
                        portfolio_amount_cents: port.amount_cents,
                        difference_cents: pay.amount_cents - port.amount_cents,
                        note: port.note,
                    });
                }
            }
            _ => {
                if !payment_only.contains(&pay.contract) {
                    payment_only.push(pay.contract.clone());
                }
            }
        }
    }

    let mut portfolio_only = Vec::new();
    for rec in portfolio {
        if !matched.contains(rec.contract.as_str()) && !portfolio_only.contains(&rec.contract) {
            portfolio_only.push(rec.contract.clone());
        }
    }

    let totals = Totals::from_rows(&rows);
    (
        ReconciledSet {
            portfolio_name: portfolio_name.to_string(),
            rows,
            totals,
        },
        JoinReport {
            payment_only,
            portfolio_only,
        },
    )
}
