use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;
use std::str::FromStr;

use clap::{builder::PossibleValue, ValueEnum};

use crate::{error::Error, Result};

/// Filter family of the subband decomposition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wavelet {
    Haar,
    /// Daubechies with one vanishing moment, identical to Haar
    Daubechies1,
    /// LeGall 5/3 biorthogonal filter in lifting form
    LeGall53,
}

impl ValueEnum for Wavelet {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Haar, Self::Daubechies1, Self::LeGall53]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(PossibleValue::new(self.name()))
    }
}

impl Wavelet {
    /// Name persisted in the container header
    pub fn name(&self) -> &'static str {
        match self {
            Self::Haar => "haar",
            Self::Daubechies1 => "db1",
            Self::LeGall53 => "legall53",
        }
    }

    /// Splits an even length signal into its low and high pass halves
    pub fn analyze(&self, signal: &[f64]) -> (Vec<f64>, Vec<f64>) {
        debug_assert!(signal.len() % 2 == 0);
        match self {
            Self::Haar | Self::Daubechies1 => haar_analyze(signal),
            Self::LeGall53 => legall_analyze(signal),
        }
    }

    /// Inverse of [`Wavelet::analyze`]
    pub fn synthesize(&self, low: &[f64], high: &[f64]) -> Vec<f64> {
        debug_assert_eq!(low.len(), high.len());
        match self {
            Self::Haar | Self::Daubechies1 => haar_synthesize(low, high),
            Self::LeGall53 => legall_synthesize(low, high),
        }
    }
}

impl fmt::Display for Wavelet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Wavelet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::value_variants()
            .iter()
            .find(|wavelet| wavelet.name() == s)
            .copied()
            .ok_or_else(|| Error::CorruptBitstream(format!("unknown wavelet '{}'", s)))
    }
}

fn haar_analyze(signal: &[f64]) -> (Vec<f64>, Vec<f64>) {
    signal
        .chunks_exact(2)
        .map(|pair| {
            (
                (pair[0] + pair[1]) * FRAC_1_SQRT_2,
                (pair[0] - pair[1]) * FRAC_1_SQRT_2,
            )
        })
        .unzip()
}

fn haar_synthesize(low: &[f64], high: &[f64]) -> Vec<f64> {
    low.iter()
        .zip(high)
        .flat_map(|(&l, &h)| [(l + h) * FRAC_1_SQRT_2, (l - h) * FRAC_1_SQRT_2])
        .collect()
}

// The right neighbour of the last odd sample is mirrored onto its left one,
// the left neighbour of the first detail onto the first detail itself.

fn legall_analyze(signal: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let half = signal.len() / 2;
    let even = |i: usize| signal[2 * i];
    let next_even = |i: usize| if i + 1 < half { signal[2 * i + 2] } else { signal[2 * i] };
    let high: Vec<f64> = (0..half)
        .map(|i| signal[2 * i + 1] - 0.5 * (even(i) + next_even(i)))
        .collect();
    let low = (0..half)
        .map(|i| {
            let previous = if i > 0 { high[i - 1] } else { high[0] };
            even(i) + 0.25 * (previous + high[i])
        })
        .collect();
    (low, high)
}

fn legall_synthesize(low: &[f64], high: &[f64]) -> Vec<f64> {
    let half = low.len();
    let even: Vec<f64> = (0..half)
        .map(|i| {
            let previous = if i > 0 { high[i - 1] } else { high[0] };
            low[i] - 0.25 * (previous + high[i])
        })
        .collect();
    let mut signal = Vec::with_capacity(2 * half);
    for i in 0..half {
        let next_even = if i + 1 < half { even[i + 1] } else { even[i] };
        signal.push(even[i]);
        signal.push(high[i] + 0.5 * (even[i] + next_even));
    }
    signal
}

#[cfg(test)]
mod test {
    use super::Wavelet;
    use clap::ValueEnum;

    const SIGNAL: [f64; 8] = [3.0, 7.0, 1.0, 1.0, -2.0, 5.0, 4.0, 6.0];

    #[test]
    fn haar_of_pairs() {
        let (low, high) = Wavelet::Haar.analyze(&[1.0, 1.0, 4.0, 2.0]);
        assert!((low[0] - 2.0_f64.sqrt()).abs() < 1e-12);
        assert!(high[0].abs() < 1e-12);
        assert!((low[1] - 6.0 / 2.0_f64.sqrt()).abs() < 1e-12);
        assert!((high[1] - 2.0 / 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn daubechies1_equals_haar() {
        assert_eq!(
            Wavelet::Daubechies1.analyze(&SIGNAL),
            Wavelet::Haar.analyze(&SIGNAL)
        );
    }

    #[test]
    fn legall_of_linear_signal_has_no_inner_detail() {
        let signal: Vec<f64> = (0..8).map(|i| i as f64 * 2.0).collect();
        let (_, high) = Wavelet::LeGall53.analyze(&signal);
        for (index, &value) in high.iter().take(3).enumerate() {
            assert!(value.abs() < 1e-12, "Detail {} is {}", index, value);
        }
    }

    #[test]
    fn analyze_and_synthesize_all_families() {
        for wavelet in Wavelet::value_variants() {
            for length in [2, 4, 8] {
                let signal = &SIGNAL[..length];
                let (low, high) = wavelet.analyze(signal);
                let restored = wavelet.synthesize(&low, &high);
                for (index, (a, b)) in restored.iter().zip(signal).enumerate() {
                    assert!(
                        (a - b).abs() < 1e-9,
                        "Sample {} of {} differs for length {}",
                        index,
                        wavelet,
                        length
                    );
                }
            }
        }
    }

    #[test]
    fn parse_names() {
        for wavelet in Wavelet::value_variants() {
            assert_eq!(wavelet.name().parse::<Wavelet>().unwrap(), *wavelet);
        }
        assert!("sym4".parse::<Wavelet>().is_err());
    }
}
