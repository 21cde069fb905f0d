//! This module contains the second-order difference ("delta-delta") transform.
//!
//! This is a Value Reduction transform: near-linear pen trajectories turn into
//! streams of small residuals. The transform keeps a two-slot history, so a
//! `DeltaDelta` value is owned by exactly one encode or decode pass and must be
//! reset before the next one.
//!
//! Residuals are computed in 64-bit arithmetic. A residual that does not fit an
//! `i32` is split into a `primary` part (the low 31 bits of its magnitude) and a
//! non-zero `extra` part (`(|raw| >> 31) << 1 | sign`) that the caller must carry
//! out-of-band.

/// One transformed sample. `extra == 0` means `primary` is the residual itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Residual {
    pub primary: i32,
    pub extra: i32,
}

impl Residual {
    #[inline]
    pub fn is_overflow(&self) -> bool {
        self.extra != 0
    }
}

/// The stateful delta-delta transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaDelta {
    /// d(i-1)
    prev: i64,
    /// d(i-2)
    prev_prev: i64,
}

impl DeltaDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zeroes both history slots. Must be called at the start of every pass.
    pub fn reset_state(&mut self) {
        self.prev = 0;
        self.prev_prev = 0;
    }

    /// Transforms the next sample: `raw = x + d(i-2) - 2 * d(i-1)`.
    pub fn transform(&mut self, x: i32) -> Residual {
        let raw = x as i64 + self.prev_prev - 2 * self.prev;
        self.prev_prev = self.prev;
        self.prev = x as i64;

        if let Ok(primary) = i32::try_from(raw) {
            return Residual { primary, extra: 0 };
        }

        let magnitude = raw.unsigned_abs();
        let sign = (raw < 0) as u64;
        Residual {
            primary: (magnitude & 0x7FFF_FFFF) as i32,
            // |raw| < 2^34, so the folded high part is at most 17.
            extra: (((magnitude >> 31) << 1) | sign) as i32,
        }
    }

    /// Reconstructs the next sample from a residual and advances the history.
    pub fn inverse_transform(&mut self, residual: Residual) -> i32 {
        let raw = if residual.extra == 0 {
            residual.primary as i64
        } else {
            let extra = residual.extra as u32 as u64;
            let magnitude = ((extra >> 1) << 31) | (residual.primary as u32 as u64 & 0x7FFF_FFFF);
            if extra & 1 != 0 {
                -(magnitude as i64)
            } else {
                magnitude as i64
            }
        };

        let x = raw.wrapping_add(2 * self.prev).wrapping_sub(self.prev_prev) as i32;
        self.prev_prev = self.prev;
        self.prev = x as i64;
        x
    }

    /// Transforms a whole buffer in one fresh pass.
    pub fn transform_all(input: &[i32]) -> Vec<Residual> {
        let mut xf = DeltaDelta::new();
        input.iter().map(|&x| xf.transform(x)).collect()
    }

    /// Inverts `transform_all` in one fresh pass.
    pub fn inverse_all(residuals: &[Residual]) -> Vec<i32> {
        let mut xf = DeltaDelta::new();
        residuals.iter().map(|&r| xf.inverse_transform(r)).collect()
    }
}
