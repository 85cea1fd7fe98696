// ********* Input data structures ***********

/// The six dimensions of the NASA-TLX questionnaire.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Subscale {
    MentalDemand,
    PhysicalDemand,
    TemporalDemand,
    Performance,
    Effort,
    Frustration,
}

impl Subscale {
    /// All the sub-scales, in questionnaire order.
    pub const ALL: [Subscale; 6] = [
        Subscale::MentalDemand,
        Subscale::PhysicalDemand,
        Subscale::TemporalDemand,
        Subscale::Performance,
        Subscale::Effort,
        Subscale::Frustration,
    ];

    /// The camelCase name, as used in the stored documents and the JSON output.
    pub fn name(&self) -> &'static str {
        match self {
            Subscale::MentalDemand => "mentalDemand",
            Subscale::PhysicalDemand => "physicalDemand",
            Subscale::TemporalDemand => "temporalDemand",
            Subscale::Performance => "performance",
            Subscale::Effort => "effort",
            Subscale::Frustration => "frustration",
        }
    }

    /// The snake_case name found in older documents.
    pub fn snake_name(&self) -> &'static str {
        match self {
            Subscale::MentalDemand => "mental_demand",
            Subscale::PhysicalDemand => "physical_demand",
            Subscale::TemporalDemand => "temporal_demand",
            Subscale::Performance => "performance",
            Subscale::Effort => "effort",
            Subscale::Frustration => "frustration",
        }
    }

    fn index(&self) -> usize {
        match self {
            Subscale::MentalDemand => 0,
            Subscale::PhysicalDemand => 1,
            Subscale::TemporalDemand => 2,
            Subscale::Performance => 3,
            Subscale::Effort => 4,
            Subscale::Frustration => 5,
        }
    }
}

/// The scores of one questionnaire. A score is missing when the source did not
/// hold a number for it.
#[derive(PartialEq, Debug, Clone, Copy, Default)]
pub struct TlxScores {
    values: [Option<f64>; 6],
}

impl TlxScores {
    pub fn new(values: [Option<f64>; 6]) -> TlxScores {
        TlxScores { values }
    }

    /// All six scores present.
    pub fn filled(values: [f64; 6]) -> TlxScores {
        TlxScores {
            values: values.map(Some),
        }
    }

    pub fn get(&self, subscale: Subscale) -> Option<f64> {
        self.values[subscale.index()]
    }

    pub fn set(&mut self, subscale: Subscale, value: Option<f64>) {
        self.values[subscale.index()] = value;
    }

    /// The six scores, if every one of them is a finite number.
    pub fn complete(&self) -> Option<[f64; 6]> {
        let mut res = [0.0; 6];
        for (idx, v) in self.values.iter().enumerate() {
            match v {
                Some(x) if x.is_finite() => res[idx] = *x,
                _ => return None,
            }
        }
        Some(res)
    }
}

/// One completed study session, as seen by the statistics.
#[derive(PartialEq, Debug, Clone)]
pub struct Session {
    /// Time spent on the task, in milliseconds.
    pub duration_ms: f64,
    pub scores: TlxScores,
}

// ******** Output data structures *********

/// A compared quantity: the task duration or one of the sub-scales.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Metric {
    Duration,
    Subscale(Subscale),
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::Duration,
        Metric::Subscale(Subscale::MentalDemand),
        Metric::Subscale(Subscale::PhysicalDemand),
        Metric::Subscale(Subscale::TemporalDemand),
        Metric::Subscale(Subscale::Performance),
        Metric::Subscale(Subscale::Effort),
        Metric::Subscale(Subscale::Frustration),
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Duration => "duration",
            Metric::Subscale(s) => s.name(),
        }
    }
}

/// Descriptive statistics for a group of sessions.
///
/// Durations are expressed in minutes.
#[derive(PartialEq, Debug, Clone)]
pub struct GroupStats {
    pub count: usize,
    pub avg_duration: f64,
    pub median_duration: f64,
    pub min_duration: f64,
    pub max_duration: f64,
    pub(crate) subscale_means: [f64; 6],
}

impl GroupStats {
    pub fn subscale_mean(&self, subscale: Subscale) -> f64 {
        self.subscale_means[subscale.index()]
    }

    /// The value used for the comparison of this metric (mean values).
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Duration => self.avg_duration,
            Metric::Subscale(s) => self.subscale_mean(s),
        }
    }
}

/// One line of the comparison table between the two variants.
#[derive(PartialEq, Debug, Clone)]
pub struct ComparisonRow {
    pub metric: Metric,
    pub optimized: f64,
    pub feature: f64,
    /// optimized - feature
    pub difference: f64,
    /// Only filled for the duration; zero for the sub-scales.
    pub percentage_diff: f64,
}
