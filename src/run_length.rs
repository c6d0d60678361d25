use crate::{error::Error, Result};

/// A run of zeros followed by one value.
///
/// `(r, 0)` with `r > 0` stands for exactly `r` zeros, `(0, 0)` for all
/// remaining positions being zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunLength {
    pub zeros: usize,
    pub value: i32,
}

impl RunLength {
    pub const SENTINEL: RunLength = RunLength { zeros: 0, value: 0 };

    pub fn new(zeros: usize, value: i32) -> Self {
        Self { zeros, value }
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }
}

pub struct RunLengthCoder {
    max_run_length: usize,
}

impl RunLengthCoder {
    pub fn new(max_run_length: usize) -> Result<Self> {
        if max_run_length == 0 {
            return Err(Error::InvalidSettings("max run length must be at least 1"));
        }
        Ok(Self { max_run_length })
    }

    pub fn encode(&self, values: &[i32]) -> Vec<RunLength> {
        let mut runs = Vec::new();
        let mut zeros = 0;
        for &value in values {
            if value == 0 {
                zeros += 1;
            } else {
                runs.push(RunLength::new(zeros, value));
                zeros = 0;
            }
        }
        if zeros > 0 || values.is_empty() {
            runs.push(RunLength::SENTINEL);
        }
        self.split_long_runs(runs)
    }

    fn split_long_runs(&self, runs: Vec<RunLength>) -> Vec<RunLength> {
        let mut output = Vec::with_capacity(runs.len());
        for run in runs {
            if run.zeros <= self.max_run_length {
                output.push(run);
                continue;
            }
            let chunks = run.zeros / self.max_run_length;
            output.extend((0..chunks).map(|_| RunLength::new(self.max_run_length, 0)));
            output.push(RunLength::new(run.zeros % self.max_run_length, run.value));
        }
        output
    }

    /// Expands `runs` back into exactly `length` values.
    pub fn decode(&self, runs: &[RunLength], length: usize) -> Result<Vec<i32>> {
        let mut output = Vec::new();
        let mut terminated = false;
        for run in runs {
            terminated = run.is_sentinel();
            if terminated {
                continue;
            }
            let room = length - output.len();
            let needed = run.zeros.checked_add(usize::from(run.value != 0));
            if needed.map_or(true, |needed| needed > room) {
                return Err(Error::DimensionMismatch(format!(
                    "run lengths expand to more than {} values",
                    length
                )));
            }
            output.resize(output.len() + run.zeros, 0);
            if run.value != 0 {
                output.push(run.value);
            }
        }
        if output.len() < length {
            if !terminated {
                return Err(Error::DimensionMismatch(format!(
                    "run lengths expand to {} of {} values without end marker",
                    output.len(),
                    length
                )));
            }
            output.resize(length, 0);
        }
        Ok(output)
    }
}
