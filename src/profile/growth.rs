//! Growth areas derived from weaknesses and developing strengths.

use crate::model::{
    GrowthArea, Priority, ProficiencyLevel, Severity, StrengthCategory, TechnicalStrength, UserWeakness,
};

const WEAKNESS_CURRENT: f64 = 35.0;
const WEAKNESS_TARGET: f64 = 70.0;
const STRENGTH_CURRENT: f64 = 60.0;
const STRENGTH_TARGET: f64 = 85.0;

fn timeline(severity: Severity) -> &'static str {
    match severity {
        Severity::Significant => "6-8 weeks",
        Severity::Moderate => "3-4 weeks",
        Severity::Minor => "1-2 weeks",
    }
}

fn priority(severity: Severity) -> Priority {
    match severity {
        Severity::Significant => Priority::High,
        Severity::Moderate => Priority::Medium,
        Severity::Minor => Priority::Low,
    }
}

fn strength_actions(category: StrengthCategory) -> Vec<String> {
    let actions: &[&str] = match category {
        StrengthCategory::ToolMastery => &[
            "Use batched multi-file edits for cross-cutting changes",
            "Delegate exploratory searches to sub-agents",
        ],
        StrengthCategory::ProblemSolving => &[
            "Start larger tasks with an explicit design discussion",
            "Close each task with a validation step",
        ],
        StrengthCategory::CodeQuality => &[
            "Ask for tests alongside every behavioural change",
            "Request a refactoring pass once the feature works",
        ],
        StrengthCategory::Architecture => &[
            "Map the module structure before changing it",
            "Capture the plan as a task list before implementation",
        ],
    };
    actions.iter().map(|s| (*s).to_string()).collect()
}

/// One growth area per weakness, then one per intermediate strength.
#[must_use]
pub fn growth_areas(weaknesses: &[UserWeakness], strengths: &[TechnicalStrength]) -> Vec<GrowthArea> {
    let from_weaknesses = weaknesses.iter().map(|w| GrowthArea {
        skill: w.area.label().to_string(),
        current_level: WEAKNESS_CURRENT,
        target_level: WEAKNESS_TARGET,
        recommended_actions: w.recommendations.clone(),
        timeline: timeline(w.severity).to_string(),
        priority: priority(w.severity),
    });

    let from_strengths = strengths
        .iter()
        .filter(|s| s.proficiency == ProficiencyLevel::Intermediate)
        .map(|s| GrowthArea {
            skill: s.category.label().to_string(),
            current_level: STRENGTH_CURRENT,
            target_level: STRENGTH_TARGET,
            recommended_actions: strength_actions(s.category),
            timeline: "4-6 weeks".to_string(),
            priority: Priority::Low,
        });

    from_weaknesses.chain(from_strengths).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Trend, WeaknessArea};

    fn strength(category: StrengthCategory, proficiency: ProficiencyLevel) -> TechnicalStrength {
        TechnicalStrength {
            category,
            confidence: 70.0,
            proficiency,
            session_count: 3,
            average_score: 60.0,
            average_complexity: 4.0,
            advanced_indicators: Vec::new(),
            trend: Trend::Stable,
            consistency: 90.0,
        }
    }

    #[test]
    fn test_growth_from_weakness_and_strength() {
        let weakness = UserWeakness {
            area: WeaknessArea::DebuggingLoops,
            severity: Severity::Significant,
            frequency: 2,
            frequency_percent: 50.0,
            description: String::new(),
            recommendations: vec!["Share the error".into()],
            improvement_potential: 85.0,
            example_sessions: Vec::new(),
        };
        let strengths = vec![
            strength(StrengthCategory::Architecture, ProficiencyLevel::Intermediate),
            strength(StrengthCategory::ToolMastery, ProficiencyLevel::Advanced),
        ];

        let areas = growth_areas(&[weakness], &strengths);
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].timeline, "6-8 weeks");
        assert_eq!(areas[0].priority, Priority::High);
        assert_eq!(areas[0].current_level, 35.0);
        assert_eq!(areas[0].recommended_actions, vec!["Share the error"]);
        assert_eq!(areas[1].skill, StrengthCategory::Architecture.label());
        assert_eq!(areas[1].target_level, 85.0);
        assert_eq!(areas[1].priority, Priority::Low);
    }
}
