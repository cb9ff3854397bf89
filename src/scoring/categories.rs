// The six interaction kinds as a single tagged variant with per-variant
// constants, rather than a type hierarchy. The same variant drives both the
// scoring engine (C7) and the cohort engine (C10) loops — adding a category
// means extending this enum plus `PointsConfig`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionCategory {
    Post,
    Like,
    Comment,
    Referral,
    Tip,
    Crypto,
}

impl InteractionCategory {
    pub const ALL: [InteractionCategory; 6] = [
        InteractionCategory::Post,
        InteractionCategory::Like,
        InteractionCategory::Comment,
        InteractionCategory::Referral,
        InteractionCategory::Tip,
        InteractionCategory::Crypto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionCategory::Post => "posts",
            InteractionCategory::Like => "likes",
            InteractionCategory::Comment => "comments",
            InteractionCategory::Referral => "referrals",
            InteractionCategory::Tip => "tipping",
            InteractionCategory::Crypto => "crypto",
        }
    }
}

impl std::fmt::Display for InteractionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for InteractionCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" | "posts" => Ok(InteractionCategory::Post),
            "like" | "likes" => Ok(InteractionCategory::Like),
            "comment" | "comments" => Ok(InteractionCategory::Comment),
            "referral" | "referrals" => Ok(InteractionCategory::Referral),
            "tip" | "tipping" => Ok(InteractionCategory::Tip),
            "crypto" => Ok(InteractionCategory::Crypto),
            other => Err(format!("unknown interaction type: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_contains_six_distinct_categories() {
        let set: std::collections::HashSet<_> = InteractionCategory::ALL.iter().collect();
        assert_eq!(set.len(), 6);
    }
}
