//! The cadence at which a cost falls due.
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Number of steps in a year
pub const STEPS_PER_YEAR: i64 = 12;

/// How often a cost is incurred
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Frequency {
    /// Once, at the trigger step
    #[default]
    OneOff,
    /// Every step
    Monthly,
    /// Every twelve steps, counting from the trigger step
    Annual,
    /// A frequency we don't recognise. Costs with this frequency are never due.
    #[serde(other)]
    #[strum(disabled)]
    Unrecognised,
}

impl Frequency {
    /// Whether a cost with this frequency is due at `step`, given the step it was triggered at.
    ///
    /// Annual costs are due whenever `step - trigger` is a multiple of twelve, which includes
    /// steps *before* the trigger step.
    pub fn is_due(self, step: u32, trigger: u32) -> bool {
        match self {
            Frequency::Monthly => true,
            Frequency::OneOff => step == trigger,
            Frequency::Annual => (i64::from(step) - i64::from(trigger)).rem_euclid(STEPS_PER_YEAR) == 0,
            Frequency::Unrecognised => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Frequency::Monthly, 0, 0, true)]
    #[case(Frequency::Monthly, 7, 3, true)]
    #[case(Frequency::OneOff, 3, 3, true)]
    #[case(Frequency::OneOff, 4, 3, false)]
    #[case(Frequency::OneOff, 0, 3, false)]
    #[case(Frequency::Annual, 0, 0, true)]
    #[case(Frequency::Annual, 12, 0, true)]
    #[case(Frequency::Annual, 11, 0, false)]
    #[case(Frequency::Annual, 14, 2, true)]
    #[case(Frequency::Annual, 0, 12, true)] // before the trigger step
    #[case(Frequency::Unrecognised, 0, 0, false)]
    fn test_is_due(
        #[case] frequency: Frequency,
        #[case] step: u32,
        #[case] trigger: u32,
        #[case] expected: bool,
    ) {
        assert_eq!(frequency.is_due(step, trigger), expected);
    }

    #[test]
    fn test_deserialise_frequency() {
        let frequencies: Vec<Frequency> =
            serde_yaml::from_str("[oneoff, monthly, annual, fortnightly]").unwrap();
        assert_eq!(
            frequencies,
            [
                Frequency::OneOff,
                Frequency::Monthly,
                Frequency::Annual,
                Frequency::Unrecognised
            ]
        );
    }
}
