// Pipeline topology and loop controller
//
// REFINE → GENERATE → JUDGE → SAFETY → {GENERATE | FINALIZE} → DONE
//
// The wiring is built once and shared read-only by every run. The only
// conditional edge is out of SAFETY, decided by `decide`.

use once_cell::sync::Lazy;
use std::fmt;

use super::state::SessionState;
use super::types::DimensionName;
use crate::config::QualityThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Refine,
    Generate,
    Judge,
    Safety,
    Finalize,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Refine => "refine",
            Stage::Generate => "generate",
            Stage::Judge => "judge",
            Stage::Safety => "safety",
            Stage::Finalize => "finalize",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the controller sends the session after SAFETY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Revise,
    Finalize,
}

impl Route {
    pub fn stage(&self) -> Stage {
        match self {
            Route::Revise => Stage::Generate,
            Route::Finalize => Stage::Finalize,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouteReason {
    IterationCap { count: u32, max: u32 },
    NoJudgeResult,
    OverallBelowThreshold { overall: f32, threshold: f32 },
    DimensionBelowThreshold {
        name: DimensionName,
        score: f32,
        threshold: f32,
    },
    SafetyViolation(String),
    Passed,
}

impl RouteReason {
    pub fn as_str(&self) -> &str {
        match self {
            RouteReason::IterationCap { .. } => "iteration_cap",
            RouteReason::NoJudgeResult => "no_judge_result",
            RouteReason::OverallBelowThreshold { .. } => "overall_below_threshold",
            RouteReason::DimensionBelowThreshold { .. } => "dimension_below_threshold",
            RouteReason::SafetyViolation(_) => "safety_violation",
            RouteReason::Passed => "passed",
        }
    }
}

impl fmt::Display for RouteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteReason::IterationCap { count, max } => {
                write!(f, "iteration cap reached ({}/{})", count, max)
            }
            RouteReason::NoJudgeResult => f.write_str("no judge result"),
            RouteReason::OverallBelowThreshold { overall, threshold } => {
                write!(f, "overall {:.1} below {:.1}", overall, threshold)
            }
            RouteReason::DimensionBelowThreshold {
                name,
                score,
                threshold,
            } => write!(f, "{} {:.1} below {:.1}", name, score, threshold),
            RouteReason::SafetyViolation(notes) => write!(f, "safety: {}", notes),
            RouteReason::Passed => f.write_str("all checks passed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub route: Route,
    pub reason: RouteReason,
}

impl Decision {
    fn revise(reason: RouteReason) -> Self {
        Self {
            route: Route::Revise,
            reason,
        }
    }

    fn finalize(reason: RouteReason) -> Self {
        Self {
            route: Route::Finalize,
            reason,
        }
    }
}

/// Loop controller: decide the edge out of SAFETY.
///
/// Checks run in a fixed order and the first match wins:
/// 1. iteration cap reached → finalize
/// 2. no judge result → finalize
/// 3. overall below threshold → revise
/// 4. any dimension below threshold → revise
/// 5. safety violation → revise
/// 6. otherwise → finalize
pub fn decide(state: &SessionState, thresholds: &QualityThresholds) -> Decision {
    let count = state.iteration_count();
    let max = state.max_iterations();
    if count >= max {
        return Decision::finalize(RouteReason::IterationCap { count, max });
    }

    let Some(result) = state.judge_result.as_ref() else {
        return Decision::finalize(RouteReason::NoJudgeResult);
    };

    if result.overall < thresholds.overall {
        return Decision::revise(RouteReason::OverallBelowThreshold {
            overall: result.overall,
            threshold: thresholds.overall,
        });
    }

    if let Some(dimension) = result.first_below(thresholds.dimension) {
        return Decision::revise(RouteReason::DimensionBelowThreshold {
            name: dimension.name,
            score: dimension.score,
            threshold: thresholds.dimension,
        });
    }

    if let Some(notes) = state.safety_violation() {
        return Decision::revise(RouteReason::SafetyViolation(notes.to_string()));
    }

    Decision::finalize(RouteReason::Passed)
}

/// Static stage wiring.
#[derive(Debug)]
pub struct Pipeline {
    edges: Vec<(Stage, Stage)>,
}

/// Process-wide topology, built on first use.
pub static PIPELINE: Lazy<Pipeline> = Lazy::new(Pipeline::build);

impl Pipeline {
    fn build() -> Self {
        tracing::debug!("Building story pipeline topology");
        Self {
            edges: vec![
                (Stage::Refine, Stage::Generate),
                (Stage::Generate, Stage::Judge),
                (Stage::Judge, Stage::Safety),
                (Stage::Finalize, Stage::Done),
            ],
        }
    }

    /// First stage for a session. A brief seeded from a prior session
    /// skips refinement.
    pub fn entry(&self, state: &SessionState) -> Stage {
        if state.refined_brief.is_some() {
            Stage::Generate
        } else {
            Stage::Refine
        }
    }

    /// Fixed successor of `stage`. `None` for SAFETY (conditional) and DONE.
    pub fn next(&self, stage: Stage) -> Option<Stage> {
        self.edges
            .iter()
            .find(|(from, _)| *from == stage)
            .map(|(_, to)| *to)
    }

    /// Successor of `stage`, consulting the controller after SAFETY.
    pub fn advance(
        &self,
        stage: Stage,
        state: &SessionState,
        thresholds: &QualityThresholds,
    ) -> (Stage, Option<Decision>) {
        if stage == Stage::Safety {
            let decision = decide(state, thresholds);
            (decision.route.stage(), Some(decision))
        } else {
            (self.next(stage).unwrap_or(Stage::Done), None)
        }
    }
}
