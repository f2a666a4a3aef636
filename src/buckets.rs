//! Quality bucket metadata
//!
//! Display labels, colors and starter habits for each category, plus labels
//! for goal types and weights. Pure constant data.

use serde::Serialize;

use crate::types::{Category, GoalType};

/// Presentation details for a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BucketInfo {
    pub category: Category,
    pub label: &'static str,
    pub description: &'static str,
    pub color: &'static str,
    pub default_habits: &'static [&'static str],
}

const VITALITY: BucketInfo = BucketInfo {
    category: Category::Vitality,
    label: "Vitality",
    description: "Physical health and energy",
    color: "#10b981",
    default_habits: &[
        "Sleep (7-8 hours)",
        "Exercise",
        "Healthy eating",
        "Hydration (8 glasses)",
        "No alcohol",
        "Vitamins/Supplements",
    ],
};

const FOCUS: BucketInfo = BucketInfo {
    category: Category::Focus,
    label: "Focus",
    description: "Cognitive performance and deep work",
    color: "#3b82f6",
    default_habits: &[
        "Deep work session",
        "Reading (30 mins)",
        "Learning/Course",
        "No social media",
        "Meditation",
        "Single-tasking",
    ],
};

const DISCIPLINE: BucketInfo = BucketInfo {
    category: Category::Discipline,
    label: "Discipline",
    description: "Consistency and daily routines",
    color: "#f59e0b",
    default_habits: &[
        "Wake up early",
        "Morning routine",
        "Cold shower",
        "Journaling",
        "Bed by 10pm",
        "No snooze",
    ],
};

const SOCIAL: BucketInfo = BucketInfo {
    category: Category::Social,
    label: "Social/Legacy",
    description: "Relationships and meaningful connections",
    color: "#8b5cf6",
    default_habits: &[
        "Family time",
        "Call a friend",
        "Networking",
        "Mentoring",
        "Community service",
        "Date night",
    ],
};

impl Category {
    /// Presentation details for this category
    pub fn bucket(&self) -> &'static BucketInfo {
        match self {
            Category::Vitality => &VITALITY,
            Category::Focus => &FOCUS,
            Category::Discipline => &DISCIPLINE,
            Category::Social => &SOCIAL,
        }
    }

    pub fn label(&self) -> &'static str {
        self.bucket().label
    }

    pub fn color(&self) -> &'static str {
        self.bucket().color
    }
}

/// All buckets in scoring order
pub fn all_buckets() -> Vec<&'static BucketInfo> {
    Category::ALL.iter().map(|c| c.bucket()).collect()
}

impl GoalType {
    pub fn label(&self) -> &'static str {
        match self {
            GoalType::Binary => "Yes/No",
            GoalType::Number => "Quantity",
            GoalType::Duration => "Duration",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            GoalType::Binary => "Simple completion tracking (Did you do it?)",
            GoalType::Number => "Track a specific number (steps, pages, etc.)",
            GoalType::Duration => "Track time spent (minutes, hours)",
        }
    }
}

/// Label for a habit weight, `None` outside 1-5
pub fn weight_label(weight: u8) -> Option<&'static str> {
    match weight {
        1 => Some("Low"),
        2 => Some("Below Average"),
        3 => Some("Average"),
        4 => Some("Above Average"),
        5 => Some("Critical"),
        _ => None,
    }
}
