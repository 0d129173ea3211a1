//! Performance metrics derived from a finished simulation.
//!
//! Only priced equity records enter the return series. A record is priced
//! when every position held that day has a close; on other calendar days
//! the curve understates the holdings.

use super::simulation::{EquityRecord, SimulationResult};
use super::trade::Trade;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub final_value: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: i64,
    pub total_trades: usize,
    pub buy_trades: usize,
    pub sell_trades: usize,
    pub traded_volume: f64,
}

impl Metrics {
    pub fn compute(result: &SimulationResult, initial_cash: f64, risk_free_rate: f64) -> Self {
        let curve: Vec<&EquityRecord> = result.equity_curve.iter().filter(|r| r.priced).collect();

        let final_value = curve
            .last()
            .map(|r| r.portfolio_value)
            .unwrap_or(initial_cash);

        let total_return = if initial_cash > 0.0 {
            (final_value - initial_cash) / initial_cash
        } else {
            0.0
        };

        let annualized_return = match (curve.first(), curve.last()) {
            (Some(first), Some(last)) => {
                let years = (last.date - first.date).num_days() as f64 / DAYS_PER_YEAR;
                if years > 0.0 && total_return.is_finite() && total_return > -1.0 {
                    (1.0 + total_return).powf(1.0 / years) - 1.0
                } else {
                    0.0
                }
            }
            _ => 0.0,
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&curve);

        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let returns = daily_returns(&curve);
        let annualized_volatility = stddev(&returns) * TRADING_DAYS_PER_YEAR.sqrt();
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(&returns, daily_rf);

        let (buy_trades, sell_trades) = count_sides(&result.trades);
        let traded_volume = result.trades.iter().map(Trade::notional).sum();

        Metrics {
            final_value,
            total_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            total_trades: result.trades.len(),
            buy_trades,
            sell_trades,
            traded_volume,
        }
    }
}

fn count_sides(trades: &[Trade]) -> (usize, usize) {
    let buys = trades.iter().filter(|t| t.is_buy()).count();
    (buys, trades.len() - buys)
}

fn daily_returns(curve: &[&EquityRecord]) -> Vec<f64> {
    curve
        .windows(2)
        .map(|w| {
            let prev = w[0].portfolio_value;
            let curr = w[1].portfolio_value;
            if prev > 0.0 {
                (curr - prev) / prev
            } else {
                0.0
            }
        })
        .collect()
}

fn stddev(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Max drawdown as a fraction of the running peak, and the longest run of
/// records spent below a peak.
fn compute_drawdown(curve: &[&EquityRecord]) -> (f64, i64) {
    let Some(first) = curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.portfolio_value;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0i64;
    let mut current_dd_duration = 0i64;

    for record in curve {
        let value = record.portfolio_value;
        if value >= peak {
            peak = value;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_dd_duration += 1;
            if current_dd_duration > max_dd_duration {
                max_dd_duration = current_dd_duration;
            }
        }
    }

    (max_dd, max_dd_duration)
}

fn compute_risk_adjusted(returns: &[f64], daily_rf: f64) -> (f64, f64) {
    if returns.is_empty() {
        return (0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let sd = stddev(returns);
    let excess_return = mean - daily_rf;

    let sharpe = if sd > 0.0 {
        (excess_return / sd) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    let downside_sq: f64 = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum();
    let downside_stddev = (downside_sq / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        (excess_return / downside_stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    (sharpe, sortino)
}
