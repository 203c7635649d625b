//! Single-pass aggregation over a stream of ages.

use crate::{row_stream::stream_ages, session::SessionProvider, Result};

/// Count and sum of the ages seen so far.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunningAggregate {
    count: u64,
    sum: u64,
}

impl RunningAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, age: u32) {
        self.count += 1;
        self.sum += u64::from(age);
    }

    /// Fold a fallible age stream, stopping at the first error.
    pub fn consume<I>(ages: I) -> Result<Self>
    where
        I: IntoIterator<Item = Result<u32>>,
    {
        let mut aggregate = Self::new();
        for age in ages {
            aggregate.push(age?);
        }
        Ok(aggregate)
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> u64 {
        self.sum
    }

    /// Arithmetic mean, or `None` when nothing was pushed.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum as f64 / self.count as f64)
        }
    }
}

impl Extend<u32> for RunningAggregate {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, ages: I) {
        for age in ages {
            self.push(age);
        }
    }
}

impl FromIterator<u32> for RunningAggregate {
    fn from_iter<I: IntoIterator<Item = u32>>(ages: I) -> Self {
        let mut aggregate = Self::new();
        aggregate.extend(ages);
        aggregate
    }
}

/// Count and sum of the `age` column of `table`, computed in one pass.
pub fn age_summary<P>(provider: &P, table: &str) -> Result<RunningAggregate>
where
    P: SessionProvider + ?Sized,
{
    RunningAggregate::consume(stream_ages(provider, table)?)
}

/// Mean age of `table`, or `None` if the table is empty.
pub fn streaming_mean<P>(provider: &P, table: &str) -> Result<Option<f64>>
where
    P: SessionProvider + ?Sized,
{
    Ok(age_summary(provider, table)?.mean())
}
