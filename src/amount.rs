use std::fmt;

/// Fixed-point decimal with 4 decimal places, stored as a scaled integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Amount(i64);

impl Amount {
    const SCALE: i64 = 10_000;
    /// One cent in scaled units.
    const CENT: i64 = Self::SCALE / 100;

    pub fn from_float(value: f64) -> Self {
        Amount((value * Self::SCALE as f64).round() as i64)
    }

    pub fn from_scaled(value: i64) -> Self {
        Amount(value)
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Multiply by a license quantity.
    pub fn times(self, quantity: u32) -> Self {
        Amount(self.0 * quantity as i64)
    }

    /// Take a whole-number percentage of this amount, rounded half away
    /// from zero at the 4th decimal.
    pub fn percent(self, pct: u8) -> Self {
        let scaled = self.0 * pct as i64;
        let half = if scaled >= 0 { 50 } else { -50 };
        Amount((scaled + half) / 100)
    }

    /// Round to 2 decimal places, half away from zero. Applied to final
    /// totals only; intermediate amounts keep full precision.
    pub fn round_to_cents(self) -> Self {
        let rem = self.0 % Self::CENT;
        let base = self.0 - rem;
        if rem.abs() * 2 >= Self::CENT {
            Amount(base + Self::CENT * rem.signum())
        } else {
            Amount(base)
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        let whole = abs / Self::SCALE;
        let frac = abs % Self::SCALE;
        write!(f, "{sign}{whole}.{frac:04}")
    }
}

impl std::ops::Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}
