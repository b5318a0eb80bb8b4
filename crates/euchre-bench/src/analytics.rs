use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::config::{AgentConfig, AgentKind, BenchmarkConfig};
use crate::tournament::{DecisionSummary, MatchOutcome};

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("baseline agent '{0}' not present in tournament results")]
    MissingBaseline(String),
    #[error("agent '{0}' defined in results but missing from configuration")]
    UnknownAgent(String),
    #[error("statistics error: {0}")]
    Statistics(String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Aggregates per-agent match results across the whole run.
pub struct AnalyticsCollector {
    baseline: String,
    agents: HashMap<String, AgentAccumulator>,
    agent_order: Vec<String>,
    latency_budget_ms: u64,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Result<Self, AnalyticsError> {
        let baseline = config.metrics.baseline.clone();

        let mut agents = HashMap::new();
        let mut order = Vec::new();
        for agent in &config.agents {
            agents.insert(
                agent.name.clone(),
                AgentAccumulator::new(agent.clone(), config.metrics.latency_budget_ms),
            );
            order.push(agent.name.clone());
        }

        if !agents.contains_key(&baseline) {
            return Err(AnalyticsError::MissingBaseline(baseline));
        }

        Ok(Self {
            baseline,
            agents,
            agent_order: order,
            latency_budget_ms: config.metrics.latency_budget_ms,
        })
    }

    pub fn record_match(&mut self, outcome: &MatchOutcome) -> Result<(), AnalyticsError> {
        for seat in &outcome.seat_results {
            let acc = self
                .agents
                .get_mut(&seat.agent_name)
                .ok_or_else(|| AnalyticsError::UnknownAgent(seat.agent_name.clone()))?;
            acc.record_match(
                seat.won,
                seat.points_for,
                seat.points_against,
                seat.calls,
                seat.euchred,
                &seat.metrics,
            );
        }
        Ok(())
    }

    pub fn finalize(mut self) -> Result<AnalyticsSummary, AnalyticsError> {
        let mut reports = Vec::new();
        for name in &self.agent_order {
            if let Some(acc) = self.agents.remove(name) {
                reports.push(acc.into_report());
            }
        }

        let baseline = reports
            .iter()
            .find(|report| report.name == self.baseline)
            .map(|report| (report.wins, report.matches))
            .ok_or_else(|| AnalyticsError::MissingBaseline(self.baseline.clone()))?;

        let normal =
            Normal::new(0.0, 1.0).map_err(|err| AnalyticsError::Statistics(err.to_string()))?;
        let comparisons = reports
            .iter()
            .map(|report| {
                let p_value = if report.name == self.baseline {
                    1.0
                } else {
                    two_proportion_p_value(&normal, (report.wins, report.matches), baseline)
                };
                ComparisonReport {
                    agent: report.name.clone(),
                    p_value,
                    sample_size: report.matches,
                }
            })
            .collect();

        Ok(AnalyticsSummary {
            baseline: self.baseline,
            agents: reports,
            comparisons,
            latency_budget_ms: self.latency_budget_ms,
        }
        .enrich())
    }
}

struct AgentAccumulator {
    config: AgentConfig,
    matches: usize,
    wins: usize,
    outcomes: Vec<f64>,
    margins: Vec<f64>,
    points_for: u64,
    points_against: u64,
    calls: u64,
    euchred: u64,
    total_latency_ms: f64,
    total_decisions: u64,
    latency_budget_ms: u64,
}

impl AgentAccumulator {
    fn new(config: AgentConfig, latency_budget_ms: u64) -> Self {
        Self {
            config,
            matches: 0,
            wins: 0,
            outcomes: Vec::new(),
            margins: Vec::new(),
            points_for: 0,
            points_against: 0,
            calls: 0,
            euchred: 0,
            total_latency_ms: 0.0,
            total_decisions: 0,
            latency_budget_ms,
        }
    }

    fn record_match(
        &mut self,
        won: bool,
        points_for: u32,
        points_against: u32,
        calls: u32,
        euchred: u32,
        metrics: &DecisionSummary,
    ) {
        self.matches += 1;
        if won {
            self.wins += 1;
        }
        self.outcomes.push(if won { 1.0 } else { 0.0 });
        self.margins
            .push(f64::from(points_for) - f64::from(points_against));
        self.points_for += u64::from(points_for);
        self.points_against += u64::from(points_against);
        self.calls += u64::from(calls);
        self.euchred += u64::from(euchred);
        self.total_latency_ms += metrics.total_ms;
        self.total_decisions += u64::from(metrics.decisions);
    }

    fn into_report(self) -> AgentReport {
        let per_match = |total: u64| {
            if self.matches == 0 {
                0.0
            } else {
                total as f64 / self.matches as f64
            }
        };
        let win_rate = if self.matches == 0 {
            0.0
        } else {
            self.wins as f64 / self.matches as f64
        };
        let avg_margin = if self.margins.is_empty() {
            0.0
        } else {
            self.margins.iter().sum::<f64>() / self.margins.len() as f64
        };
        let avg_latency = if self.total_decisions == 0 {
            0.0
        } else {
            self.total_latency_ms / self.total_decisions as f64
        };
        let euchre_rate = if self.calls == 0 {
            0.0
        } else {
            self.euchred as f64 / self.calls as f64
        };

        AgentReport {
            name: self.config.name.clone(),
            kind: self.config.kind,
            params: self.config.params.clone(),
            matches: self.matches,
            wins: self.wins,
            win_rate,
            win_ci95: confidence_interval(&self.outcomes),
            avg_margin,
            margin_ci95: confidence_interval(&self.margins),
            avg_points_for: per_match(self.points_for),
            avg_points_against: per_match(self.points_against),
            calls: self.calls,
            euchre_rate,
            average_ms_per_decision: avg_latency,
            delta_vs_baseline: 0.0,
            over_budget: avg_latency > self.latency_budget_ms as f64,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub baseline: String,
    pub agents: Vec<AgentReport>,
    pub comparisons: Vec<ComparisonReport>,
    pub latency_budget_ms: u64,
}

impl AnalyticsSummary {
    /// Fills in each agent's win-rate delta against the baseline.
    pub fn enrich(mut self) -> Self {
        let baseline_rate = self
            .agents
            .iter()
            .find(|agent| agent.name == self.baseline)
            .map(|agent| agent.win_rate)
            .unwrap_or(0.0);
        for agent in &mut self.agents {
            agent.delta_vs_baseline = agent.win_rate - baseline_rate;
        }
        self
    }

    pub fn p_value(&self, agent: &str) -> f64 {
        self.comparisons
            .iter()
            .find(|c| c.agent == agent)
            .map(|c| c.p_value)
            .unwrap_or(1.0)
    }

    pub fn render_markdown(&self) -> String {
        let mut rows = String::new();
        rows.push_str("# Tournament Summary\n\n");
        rows.push_str(&format!("Baseline: `{}`\n\n", self.baseline));
        rows.push_str(&format!(
            "Latency budget: {} ms average per decision\n\n",
            self.latency_budget_ms
        ));
        rows.push_str("| Agent | Kind | Matches | Win % | 95% CI | Δ win vs baseline | Avg margin | Pts for | Pts against | Calls | Euchred % | Avg ms/decision | Over Budget | p-value |\n");
        rows.push_str("|-------|------|---------|-------|--------|-------------------|------------|---------|-------------|-------|-----------|-----------------|-------------|---------|\n");

        for agent in &self.agents {
            rows.push_str(&format!(
                "| {name} | {kind:?} | {matches} | {win:.1}% | [{ci_low:.1}%, {ci_high:.1}%] | {delta:+.1} pp | {margin:+.2} | {pf:.2} | {pa:.2} | {calls} | {euchred:.1}% | {latency:.3} | {over_budget} | {pval:.3} |\n",
                name = agent.name,
                kind = agent.kind,
                matches = agent.matches,
                win = agent.win_rate * 100.0,
                ci_low = agent.win_ci95.0 * 100.0,
                ci_high = agent.win_ci95.1 * 100.0,
                delta = agent.delta_vs_baseline * 100.0,
                margin = agent.avg_margin,
                pf = agent.avg_points_for,
                pa = agent.avg_points_against,
                calls = agent.calls,
                euchred = agent.euchre_rate * 100.0,
                latency = agent.average_ms_per_decision,
                over_budget = if agent.over_budget { "Yes" } else { "No" },
                pval = self.p_value(&agent.name),
            ));
        }
        rows
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        fs::write(path.as_ref(), self.render_markdown()).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub kind: AgentKind,
    pub params: serde_yaml::Value,
    pub matches: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub win_ci95: (f64, f64),
    pub avg_margin: f64,
    pub margin_ci95: (f64, f64),
    pub avg_points_for: f64,
    pub avg_points_against: f64,
    pub calls: u64,
    pub euchre_rate: f64,
    pub average_ms_per_decision: f64,
    #[serde(skip)]
    pub delta_vs_baseline: f64,
    #[serde(skip)]
    pub over_budget: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub agent: String,
    pub p_value: f64,
    pub sample_size: usize,
}

/// Two-sided pooled z-test for a difference in win rates.
fn two_proportion_p_value(normal: &Normal, agent: (usize, usize), baseline: (usize, usize)) -> f64 {
    let (wins_a, n_a) = agent;
    let (wins_b, n_b) = baseline;
    if n_a == 0 || n_b == 0 {
        return 1.0;
    }
    let (n_a, n_b) = (n_a as f64, n_b as f64);
    let rate_a = wins_a as f64 / n_a;
    let rate_b = wins_b as f64 / n_b;
    let pooled = (wins_a + wins_b) as f64 / (n_a + n_b);
    let std_error = (pooled * (1.0 - pooled) * (1.0 / n_a + 1.0 / n_b)).sqrt();
    if std_error <= f64::EPSILON {
        return 1.0;
    }
    let z = (rate_a - rate_b).abs() / std_error;
    (2.0 * (1.0 - normal.cdf(z))).clamp(0.0, 1.0)
}

fn confidence_interval(samples: &[f64]) -> (f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    if samples.len() == 1 {
        return (mean, mean);
    }
    let variance = samples
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (samples.len() as f64 - 1.0);
    let std_error = (variance / samples.len() as f64).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    (mean - margin, mean + margin)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_normal() -> Normal {
        Normal::new(0.0, 1.0).unwrap()
    }

    fn report(name: &str, wins: usize, matches: usize) -> AgentReport {
        AgentReport {
            name: name.to_string(),
            kind: AgentKind::Heuristic,
            params: serde_yaml::Value::Null,
            matches,
            wins,
            win_rate: wins as f64 / matches as f64,
            win_ci95: (0.0, 1.0),
            avg_margin: 0.0,
            margin_ci95: (0.0, 0.0),
            avg_points_for: 0.0,
            avg_points_against: 0.0,
            calls: 0,
            euchre_rate: 0.0,
            average_ms_per_decision: 0.5,
            delta_vs_baseline: 0.0,
            over_budget: false,
        }
    }

    #[test]
    fn equal_win_rates_are_not_significant() {
        let p = two_proportion_p_value(&standard_normal(), (50, 100), (50, 100));
        assert!((p - 1.0).abs() < 1e-9);
    }

    #[test]
    fn lopsided_win_rates_are_significant() {
        let p = two_proportion_p_value(&standard_normal(), (80, 100), (40, 100));
        assert!(p < 0.001);
        let symmetric = two_proportion_p_value(&standard_normal(), (40, 100), (80, 100));
        assert!((p - symmetric).abs() < 1e-12);
    }

    #[test]
    fn degenerate_samples_give_unit_p_value() {
        let normal = standard_normal();
        assert_eq!(two_proportion_p_value(&normal, (0, 0), (3, 5)), 1.0);
        assert_eq!(two_proportion_p_value(&normal, (5, 5), (5, 5)), 1.0);
    }

    #[test]
    fn confidence_interval_brackets_the_mean() {
        let (low, high) = confidence_interval(&[1.0, 0.0, 1.0, 1.0]);
        assert!(low < 0.75 && 0.75 < high);
        assert_eq!(confidence_interval(&[2.0]), (2.0, 2.0));
        assert_eq!(confidence_interval(&[]), (0.0, 0.0));
    }

    #[test]
    fn enrich_measures_delta_against_baseline() {
        let summary = AnalyticsSummary {
            baseline: "base".into(),
            agents: vec![report("base", 5, 10), report("bold", 7, 10)],
            comparisons: Vec::new(),
            latency_budget_ms: 1_200,
        }
        .enrich();
        assert!(summary.agents[0].delta_vs_baseline.abs() < 1e-12);
        assert!((summary.agents[1].delta_vs_baseline - 0.2).abs() < 1e-12);
        assert_eq!(summary.p_value("bold"), 1.0);
    }

    #[test]
    fn markdown_lists_every_agent() {
        let summary = AnalyticsSummary {
            baseline: "base".into(),
            agents: vec![report("base", 5, 10), report("bold", 7, 10)],
            comparisons: vec![ComparisonReport {
                agent: "bold".into(),
                p_value: 0.25,
                sample_size: 10,
            }],
            latency_budget_ms: 1_200,
        }
        .enrich();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.md");
        summary.write_markdown(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# Tournament Summary"));
        assert!(text.contains("| base | Heuristic | 10 | 50.0%"));
        assert!(text.contains("| bold | Heuristic | 10 | 70.0%"));
        assert!(text.contains("+20.0 pp"));
        assert!(text.contains("| 0.250 |"));
    }
}
