// Cohort engine (C10) output types.

use std::collections::{BTreeMap, BTreeSet};

use crate::scoring::InteractionCategory;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryCohort {
    pub qualified: BTreeSet<String>,
    pub empathy: BTreeSet<String>,
}

pub type CohortSummary = BTreeMap<InteractionCategory, CategoryCohort>;
