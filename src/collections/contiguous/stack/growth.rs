use derive_more::{Display, Error};

/// The policy used by [`Stack`](super::Stack) to pick a new capacity when it runs out of room.
///
/// Starting from the current capacity, `cap = cap * num / den + lin` is applied until the result
/// fits the requested capacity. The linear term keeps small stacks from reallocating on every
/// push, while the ratio amortizes the cost of pushing to `O(1)` without doubling memory use.
///
/// # Examples
/// ```
/// # use foundation_lib::collections::contiguous::GrowthPolicy;
/// let policy = GrowthPolicy::default();
/// assert_eq!(policy.calculate_growth(0, 1), 8);
/// assert_eq!(policy.calculate_growth(8, 9), 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GrowthPolicy {
    pub(crate) num: usize,
    pub(crate) den: usize,
    pub(crate) lin: usize,
}

/// The error returned by [`GrowthPolicy::new`] for a policy that can stall.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("growth policy {num}/{den} + {lin} doesn't grow from every capacity")]
pub struct InvalidGrowthPolicy {
    pub num: usize,
    pub den: usize,
    pub lin: usize,
}

impl GrowthPolicy {
    /// The default policy: grow by a ratio of 3/2, plus 8 elements.
    pub const DEFAULT: GrowthPolicy = GrowthPolicy { num: 3, den: 2, lin: 8 };

    /// Creates a new policy growing by `num / den` and then adding `lin`.
    ///
    /// # Errors
    /// Returns [`InvalidGrowthPolicy`] if `den` is zero or if the policy wouldn't strictly increase
    /// every capacity (which requires `num >= den` and `lin > 0`).
    pub const fn new(num: usize, den: usize, lin: usize) -> Result<GrowthPolicy, InvalidGrowthPolicy> {
        if den == 0 || num < den || lin == 0 {
            Err(InvalidGrowthPolicy { num, den, lin })
        } else {
            Ok(GrowthPolicy { num, den, lin })
        }
    }

    /// Returns the growth ratio as `(numerator, denominator)`.
    pub const fn ratio(&self) -> (usize, usize) {
        (self.num, self.den)
    }

    /// Returns the linear term added each step.
    pub const fn linear(&self) -> usize {
        self.lin
    }

    /// Calculates the capacity to grow to from `current` so that at least `target` elements fit.
    ///
    /// The result is always `>= target` and `>= current`. If the policy would overflow, the
    /// result saturates at [`usize::MAX`], which means the allocation will fail further down the
    /// line rather than silently under-allocating.
    pub const fn calculate_growth(&self, current: usize, target: usize) -> usize {
        if current >= target {
            return current;
        }
        if self.num == self.den {
            // A purely linear policy takes one step per `lin` elements.
            let steps = (target - current).div_ceil(self.lin);
            return current.saturating_add(steps.saturating_mul(self.lin));
        }

        let mut cap = current;
        while cap < target {
            cap = match cap.checked_mul(self.num) {
                Some(scaled) => (scaled / self.den).saturating_add(self.lin),
                // Multiplying first keeps precision, but isn't required for large capacities.
                None => (cap / self.den).saturating_mul(self.num).saturating_add(self.lin),
            };
        }
        cap
    }
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        GrowthPolicy::DEFAULT
    }
}
