use std::collections::HashMap;

use crate::corpus::Line;

/// Numeric stylistic measurements that are discretized against a training
/// average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericFeature {
    Position,
    NumberOfTokens,
    NumberOfChars,
    NumberOfQuoteSymbols,
    AverageTokenLength,
    ProportionOfUppercaseChars,
    ProportionOfAlphabeticChars,
    ProportionOfNumericChars,
}

impl NumericFeature {
    pub const ALL: [NumericFeature; 8] = [
        NumericFeature::Position,
        NumericFeature::NumberOfTokens,
        NumericFeature::NumberOfChars,
        NumericFeature::NumberOfQuoteSymbols,
        NumericFeature::AverageTokenLength,
        NumericFeature::ProportionOfUppercaseChars,
        NumericFeature::ProportionOfAlphabeticChars,
        NumericFeature::ProportionOfNumericChars,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::NumberOfTokens => "number_of_tokens",
            Self::NumberOfChars => "number_of_chars",
            Self::NumberOfQuoteSymbols => "number_of_quote_symbols",
            Self::AverageTokenLength => "average_token_length",
            Self::ProportionOfUppercaseChars => "proportion_of_uppercase_chars",
            Self::ProportionOfAlphabeticChars => "proportion_of_alphabetic_chars",
            Self::ProportionOfNumericChars => "proportion_of_numeric_chars",
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::NumberOfTokens | Self::NumberOfChars | Self::NumberOfQuoteSymbols
        )
    }

    fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|feature| *feature == self)
            .unwrap_or_default()
    }

    /// Raw value for a line. Lines always hold at least one token, so the
    /// denominators are non-zero.
    pub fn measure(self, line: &Line) -> f64 {
        let text = line.text();
        let chars = text.chars().count() as f64;
        let share = |predicate: fn(&char) -> bool| {
            text.chars().filter(predicate).count() as f64 / chars
        };

        match self {
            Self::Position => line.position_ratio(),
            Self::NumberOfTokens => line.tokens.len() as f64,
            Self::NumberOfChars => chars,
            Self::NumberOfQuoteSymbols => text.matches('>').count() as f64,
            Self::AverageTokenLength => {
                let total: usize = line.tokens.iter().map(|t| t.chars().count()).sum();
                total as f64 / line.tokens.len() as f64
            }
            Self::ProportionOfUppercaseChars => share(|c| c.is_uppercase()),
            Self::ProportionOfAlphabeticChars => share(|c| c.is_alphabetic()),
            Self::ProportionOfNumericChars => share(|c| c.is_numeric()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Lowest,
    Low,
    High,
    Highest,
}

impl Tier {
    /// Checks run in this order: highest, low, lowest, high.
    pub fn classify(value: f64, average: f64) -> Self {
        if value > average * 1.5 {
            Self::Highest
        } else if value < average {
            Self::Low
        } else if value < average / 2.0 {
            Self::Lowest
        } else {
            Self::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lowest => "lowest",
            Self::Low => "low",
            Self::High => "high",
            Self::Highest => "highest",
        }
    }
}

/// Training-partition statistics for one fold.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    averages: [f64; 8],
    token_counts: HashMap<String, usize>,
    min_occurrences: f64,
}

impl Statistics {
    /// Tokens occurring no more than `occurrence_quotient * total_tokens`
    /// times are dropped from hinge features; a quotient of 0 keeps all.
    pub fn from_training<'a>(
        lines: impl IntoIterator<Item = &'a Line>,
        occurrence_quotient: f64,
    ) -> Self {
        let mut sums = [0.0_f64; 8];
        let mut instances = 0;
        let mut token_counts = HashMap::<String, usize>::new();
        let mut total_tokens = 0;

        for line in lines {
            for feature in NumericFeature::ALL {
                sums[feature.index()] += feature.measure(line);
            }
            instances += 1;

            for token in &line.tokens {
                *token_counts.entry(token.to_lowercase()).or_default() += 1;
            }
            total_tokens += line.tokens.len();
        }

        let averages = if instances == 0 {
            [0.0; 8]
        } else {
            sums.map(|sum| sum / instances as f64)
        };

        Self {
            averages,
            token_counts,
            min_occurrences: total_tokens as f64 * occurrence_quotient.max(0.0),
        }
    }

    pub fn average(&self, feature: NumericFeature) -> f64 {
        self.averages[feature.index()]
    }

    pub fn tier(&self, feature: NumericFeature, value: f64) -> Tier {
        Tier::classify(value, self.average(feature))
    }

    pub fn is_relevant(&self, token: &str) -> bool {
        if self.min_occurrences <= 0.0 {
            return true;
        }
        let count = self
            .token_counts
            .get(&token.to_lowercase())
            .copied()
            .unwrap_or(0);
        count as f64 > self.min_occurrences
    }
}
