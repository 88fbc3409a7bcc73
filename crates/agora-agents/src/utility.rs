//! Utility functions over holdings of goods A and B.
//!
//! The core only ever sees the [`Utility`] capability. Concrete forms live
//! in the serializable [`UtilityForm`] enum, picked per agent when the
//! scenario is built.
//!
//! Utility levels are evaluated at true quantities. Marginal utilities may
//! be evaluated at epsilon-floored quantities by the caller; the functions
//! here make no flooring decisions of their own.

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Capability consumed by quote generation, search and bargaining.
pub trait Utility {
    /// Utility level from goods alone.
    fn utility_of_goods(&self, a: f64, b: f64) -> f64;

    /// Partial derivative with respect to good A.
    fn marginal_utility_a(&self, a: f64, b: f64) -> f64;

    /// Partial derivative with respect to good B.
    fn marginal_utility_b(&self, a: f64, b: f64) -> f64;
}

/// Constant elasticity of substitution:
/// `U = (w_a A^rho + w_b B^rho)^(1/rho)`, Cobb-Douglas `A^w_a B^w_b` at
/// `rho = 0`.
///
/// Negative `rho` makes the goods complements; with a zero holding the
/// level is `0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ces {
    /// Substitution parameter, `rho < 1`.
    pub rho: f64,
    /// Weight on good A.
    pub w_a: f64,
    /// Weight on good B.
    pub w_b: f64,
}

/// Tolerance under which `rho` is treated as the Cobb-Douglas limit.
const COBB_DOUGLAS_TOLERANCE: f64 = 1e-12;

impl Ces {
    const fn is_cobb_douglas(&self) -> bool {
        self.rho.abs() < COBB_DOUGLAS_TOLERANCE
    }

    /// `w_a A^rho + w_b B^rho`.
    fn inner(&self, a: f64, b: f64) -> f64 {
        self.w_a.mul_add(a.powf(self.rho), self.w_b * b.powf(self.rho))
    }

    /// Common factor `inner^(1/rho - 1)` of both partial derivatives.
    fn outer_derivative(&self, a: f64, b: f64) -> f64 {
        self.inner(a, b).powf(self.rho.recip() - 1.0)
    }
}

impl Utility for Ces {
    fn utility_of_goods(&self, a: f64, b: f64) -> f64 {
        if self.is_cobb_douglas() {
            return a.powf(self.w_a) * b.powf(self.w_b);
        }
        if self.rho < 0.0 && (a <= 0.0 || b <= 0.0) {
            return 0.0;
        }
        self.inner(a, b).powf(self.rho.recip())
    }

    fn marginal_utility_a(&self, a: f64, b: f64) -> f64 {
        if self.is_cobb_douglas() {
            return self.w_a * a.powf(self.w_a - 1.0) * b.powf(self.w_b);
        }
        self.w_a * a.powf(self.rho - 1.0) * self.outer_derivative(a, b)
    }

    fn marginal_utility_b(&self, a: f64, b: f64) -> f64 {
        if self.is_cobb_douglas() {
            return self.w_b * a.powf(self.w_a) * b.powf(self.w_b - 1.0);
        }
        self.w_b * b.powf(self.rho - 1.0) * self.outer_derivative(a, b)
    }
}

/// Perfect substitutes: `U = v_a A + v_b B`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Linear {
    /// Value per unit of A.
    pub v_a: f64,
    /// Value per unit of B.
    pub v_b: f64,
}

impl Utility for Linear {
    fn utility_of_goods(&self, a: f64, b: f64) -> f64 {
        self.v_a.mul_add(a, self.v_b * b)
    }

    fn marginal_utility_a(&self, _a: f64, _b: f64) -> f64 {
        self.v_a
    }

    fn marginal_utility_b(&self, _a: f64, _b: f64) -> f64 {
        self.v_b
    }
}

/// Bliss-point utility with satiation:
/// `U = -s_a (A - A*)^2 - s_b (B - B*)^2 - gamma (A - A*)(B - B*)`.
///
/// Past the bliss point marginal utility turns negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadratic {
    /// Bliss quantity of A.
    pub bliss_a: f64,
    /// Bliss quantity of B.
    pub bliss_b: f64,
    /// Curvature in A.
    pub sigma_a: f64,
    /// Curvature in B.
    pub sigma_b: f64,
    /// Cross term.
    #[serde(default)]
    pub gamma: f64,
}

impl Utility for Quadratic {
    fn utility_of_goods(&self, a: f64, b: f64) -> f64 {
        let da = a - self.bliss_a;
        let db = b - self.bliss_b;
        -(self.sigma_a * da * da) - self.sigma_b * db * db - self.gamma * da * db
    }

    fn marginal_utility_a(&self, a: f64, b: f64) -> f64 {
        let da = a - self.bliss_a;
        let db = b - self.bliss_b;
        (-2.0 * self.sigma_a).mul_add(da, -(self.gamma * db))
    }

    fn marginal_utility_b(&self, a: f64, b: f64) -> f64 {
        let da = a - self.bliss_a;
        let db = b - self.bliss_b;
        (-2.0 * self.sigma_b).mul_add(db, -(self.gamma * da))
    }
}

/// The utility form attached to an agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum UtilityForm {
    /// Constant elasticity of substitution.
    Ces(Ces),
    /// Perfect substitutes.
    Linear(Linear),
    /// Bliss point with satiation.
    Quadratic(Quadratic),
}

impl UtilityForm {
    /// Cobb-Douglas with the given weights.
    pub const fn cobb_douglas(w_a: f64, w_b: f64) -> Self {
        Self::Ces(Ces { rho: 0.0, w_a, w_b })
    }

    /// Borrow as the capability trait.
    pub fn as_utility(&self) -> &dyn Utility {
        match self {
            Self::Ces(u) => u,
            Self::Linear(u) => u,
            Self::Quadratic(u) => u,
        }
    }

    /// Check that parameters are finite and in range.
    pub fn validate(&self) -> Result<(), AgentError> {
        let reject = |reason: &str| {
            Err(AgentError::InvalidUtility {
                reason: reason.to_owned(),
            })
        };
        match self {
            Self::Ces(u) => {
                if !(u.rho.is_finite() && u.rho < 1.0) {
                    return reject("ces rho must be finite and below 1");
                }
                if !(u.w_a > 0.0 && u.w_b > 0.0 && u.w_a.is_finite() && u.w_b.is_finite()) {
                    return reject("ces weights must be positive");
                }
            }
            Self::Linear(u) => {
                if !(u.v_a >= 0.0 && u.v_b >= 0.0 && u.v_a.is_finite() && u.v_b.is_finite()) {
                    return reject("linear values must be non-negative");
                }
            }
            Self::Quadratic(u) => {
                let params = [u.bliss_a, u.bliss_b, u.sigma_a, u.sigma_b, u.gamma];
                if params.iter().any(|p| !p.is_finite()) {
                    return reject("quadratic parameters must be finite");
                }
                if u.sigma_a <= 0.0 || u.sigma_b <= 0.0 {
                    return reject("quadratic curvature must be positive");
                }
            }
        }
        Ok(())
    }
}

impl Utility for UtilityForm {
    fn utility_of_goods(&self, a: f64, b: f64) -> f64 {
        self.as_utility().utility_of_goods(a, b)
    }

    fn marginal_utility_a(&self, a: f64, b: f64) -> f64 {
        self.as_utility().marginal_utility_a(a, b)
    }

    fn marginal_utility_b(&self, a: f64, b: f64) -> f64 {
        self.as_utility().marginal_utility_b(a, b)
    }
}
