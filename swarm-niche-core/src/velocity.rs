//! Velocity providers
//!
//! A velocity provider computes a particle's next velocity. Providers compose
//! as a decorator chain: [`ClampingVelocity`] and [`GcVelocity`] each own a
//! boxed delegate, so cloning a chain deep-clones every link and no two
//! particles ever share a delegate.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::control::{ControlParameter, Progress};

/// Inputs to a velocity computation for one particle.
#[derive(Debug, Clone, Copy)]
pub struct VelocityContext<'a> {
    pub position: &'a [f64],
    pub velocity: &'a [f64],
    pub personal_best: &'a [f64],
    pub neighbourhood_best: &'a [f64],
    /// The particle is its own neighbourhood best
    pub is_neighbourhood_best: bool,
    pub progress: Progress,
}

/// Composable velocity update strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VelocityProvider {
    Standard(StandardVelocity),
    Clamping(ClampingVelocity),
    GuaranteedConvergence(GcVelocity),
}

impl Default for VelocityProvider {
    fn default() -> Self {
        Self::Standard(StandardVelocity::default())
    }
}

impl VelocityProvider {
    /// Next velocity for the particle described by `ctx`
    pub fn velocity<R: Rng + ?Sized>(&mut self, ctx: &VelocityContext<'_>, rng: &mut R) -> Vec<f64> {
        match self {
            Self::Standard(provider) => provider.velocity(ctx, rng),
            Self::Clamping(provider) => provider.velocity(ctx, rng),
            Self::GuaranteedConvergence(provider) => provider.velocity(ctx, rng),
        }
    }

    /// Adapt internal parameters after the particle was evaluated.
    ///
    /// `improved` is whether the particle's personal best improved this
    /// iteration.
    pub fn update_control_parameters(
        &mut self,
        is_neighbourhood_best: bool,
        improved: bool,
        progress: Progress,
    ) {
        match self {
            Self::Standard(_) => {}
            Self::Clamping(provider) => provider.delegate.update_control_parameters(
                is_neighbourhood_best,
                improved,
                progress,
            ),
            Self::GuaranteedConvergence(provider) => {
                provider.update_control_parameters(is_neighbourhood_best, improved, progress)
            }
        }
    }

    /// Number of providers in the chain, this one included
    pub fn depth(&self) -> usize {
        match self {
            Self::Standard(_) => 1,
            Self::Clamping(provider) => 1 + provider.delegate.depth(),
            Self::GuaranteedConvergence(provider) => 1 + provider.delegate.depth(),
        }
    }
}

/// Inertia-weighted velocity update:
/// `v = w·v + c1·r1·(y − x) + c2·r2·(ŷ − x)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardVelocity {
    pub inertia: ControlParameter,
    pub social: ControlParameter,
    pub cognitive: ControlParameter,
}

impl Default for StandardVelocity {
    fn default() -> Self {
        Self::new(
            ControlParameter::constant(0.729844),
            ControlParameter::constant(1.496180),
            ControlParameter::constant(1.496180),
        )
    }
}

impl StandardVelocity {
    pub fn new(
        inertia: ControlParameter,
        social: ControlParameter,
        cognitive: ControlParameter,
    ) -> Self {
        Self {
            inertia,
            social,
            cognitive,
        }
    }

    fn velocity<R: Rng + ?Sized>(&mut self, ctx: &VelocityContext<'_>, rng: &mut R) -> Vec<f64> {
        let w = self.inertia.value(ctx.progress);
        let c1 = self.cognitive.value(ctx.progress);
        let c2 = self.social.value(ctx.progress);

        (0..ctx.velocity.len())
            .map(|i| {
                let r1 = rng.gen::<f64>();
                let r2 = rng.gen::<f64>();
                w * ctx.velocity[i]
                    + c1 * r1 * (ctx.personal_best[i] - ctx.position[i])
                    + c2 * r2 * (ctx.neighbourhood_best[i] - ctx.position[i])
            })
            .collect()
    }
}

/// Clamps every component of the delegate's velocity to `[-maximum, maximum]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClampingVelocity {
    pub maximum: ControlParameter,
    pub delegate: Box<VelocityProvider>,
}

impl ClampingVelocity {
    pub fn new(maximum: ControlParameter, delegate: VelocityProvider) -> Self {
        Self {
            maximum,
            delegate: Box::new(delegate),
        }
    }

    fn velocity<R: Rng + ?Sized>(&mut self, ctx: &VelocityContext<'_>, rng: &mut R) -> Vec<f64> {
        let v_max = self.maximum.value(ctx.progress).abs();
        let mut velocity = self.delegate.velocity(ctx, rng);
        for v in velocity.iter_mut() {
            *v = v.clamp(-v_max, v_max);
        }
        velocity
    }
}

const GC_DEFAULT_INERTIA: f64 = 0.729844;
const GC_SUCCESS_THRESHOLD: u32 = 15;
const GC_FAILURE_THRESHOLD: u32 = 5;
const GC_RHO_EXPAND: f64 = 2.0;
const GC_RHO_CONTRACT: f64 = 0.5;

/// Guaranteed-convergence velocity.
///
/// A particle that is its own neighbourhood best searches a box of side `2ρ`
/// around the best position:
/// `v = −x + ŷ + w·v + ρ·(1 − 2r)`.
/// Every other particle is handled by the delegate. `ρ` doubles after more
/// than 15 consecutive successes and halves after more than 5 consecutive
/// failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GcVelocity {
    pub delegate: Box<VelocityProvider>,
    pub rho: ControlParameter,
    pub inertia: ControlParameter,
    pub success_threshold: u32,
    pub failure_threshold: u32,
    pub rho_expand: f64,
    pub rho_contract: f64,
    #[serde(skip)]
    successes: u32,
    #[serde(skip)]
    failures: u32,
}

impl GcVelocity {
    /// Wrap `delegate` with `ρ = 1.0` and the standard adaptation thresholds
    pub fn new(delegate: VelocityProvider) -> Self {
        Self {
            delegate: Box::new(delegate),
            rho: ControlParameter::constant(1.0),
            inertia: ControlParameter::constant(GC_DEFAULT_INERTIA),
            success_threshold: GC_SUCCESS_THRESHOLD,
            failure_threshold: GC_FAILURE_THRESHOLD,
            rho_expand: GC_RHO_EXPAND,
            rho_contract: GC_RHO_CONTRACT,
            successes: 0,
            failures: 0,
        }
    }

    pub fn with_rho(mut self, rho: ControlParameter) -> Self {
        self.rho = rho;
        self
    }

    pub fn with_inertia(mut self, inertia: ControlParameter) -> Self {
        self.inertia = inertia;
        self
    }

    /// Consecutive successes and failures recorded so far
    pub fn counters(&self) -> (u32, u32) {
        (self.successes, self.failures)
    }

    fn velocity<R: Rng + ?Sized>(&mut self, ctx: &VelocityContext<'_>, rng: &mut R) -> Vec<f64> {
        if !ctx.is_neighbourhood_best {
            return self.delegate.velocity(ctx, rng);
        }

        let w = self.inertia.value(ctx.progress);
        let rho = self.rho.value(ctx.progress);
        (0..ctx.velocity.len())
            .map(|i| {
                -ctx.position[i]
                    + ctx.neighbourhood_best[i]
                    + w * ctx.velocity[i]
                    + rho * (1.0 - 2.0 * rng.gen::<f64>())
            })
            .collect()
    }

    fn update_control_parameters(
        &mut self,
        is_neighbourhood_best: bool,
        improved: bool,
        progress: Progress,
    ) {
        if is_neighbourhood_best {
            if improved {
                self.successes += 1;
                self.failures = 0;
            } else {
                self.failures += 1;
                self.successes = 0;
            }

            if self.successes > self.success_threshold {
                let rho = self.rho.value(progress);
                self.rho = ControlParameter::constant(rho * self.rho_expand);
            } else if self.failures > self.failure_threshold {
                let rho = self.rho.value(progress);
                self.rho = ControlParameter::constant(rho * self.rho_contract);
            }
        }

        self.delegate
            .update_control_parameters(is_neighbourhood_best, improved, progress);
    }
}
