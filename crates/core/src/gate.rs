//! Trial/payment gating in front of the orchestrator.
//!
//! A submitted config is held as pending until the user confirms or cancels.
//! Confirmation consults the pricing policy: free runs bypass the payment
//! collaborator entirely, paid runs invoke it and only hand the config out on
//! its success. The collaborator itself is a black box behind
//! [`PaymentProvider`].

use crate::error::{AppError, Result};
use crate::types::GenerationConfig;

/// Pricing policy applied when a generation is confirmed.
///
/// The deployed default is `AlwaysFree`; the paid transition exists but is
/// dormant until the policy is switched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrialPolicy {
    /// Every generation is free.
    #[default]
    AlwaysFree,
    /// The first-ever generation is free, later ones are paid.
    FirstFree,
    /// Every generation is paid.
    AlwaysPaid,
}

impl TrialPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "free" | "always-free" => Some(Self::AlwaysFree),
            "first-free" | "trial" => Some(Self::FirstFree),
            "paid" | "always-paid" => Some(Self::AlwaysPaid),
            _ => None,
        }
    }

    /// Whether this run requires the payment collaborator.
    fn requires_payment(&self, trial_used: bool) -> bool {
        match self {
            Self::AlwaysFree => false,
            Self::FirstFree => trial_used,
            Self::AlwaysPaid => true,
        }
    }
}

/// External checkout collaborator. Opaque beyond its success/failure result.
pub trait PaymentProvider {
    fn collect(&self) -> Result<()>;
}

/// Outcome of [`UsageGate::confirm`].
#[derive(Debug, PartialEq)]
pub enum GateOutcome {
    /// The config was admitted; orchestration may start. The flag reports
    /// whether this run consumed the free trial.
    Admitted { config: GenerationConfig, used_free_trial: bool },
    /// Nothing was pending.
    NothingPending,
}

/// LOCKED(pending) / UNLOCKED state machine.
#[derive(Debug, Default)]
pub struct UsageGate {
    pending: Option<GenerationConfig>,
    policy: TrialPolicy,
}

impl UsageGate {
    pub fn new(policy: TrialPolicy) -> Self {
        Self { pending: None, policy }
    }

    pub fn is_locked(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&GenerationConfig> {
        self.pending.as_ref()
    }

    /// Stores the config and locks the gate until confirm or cancel.
    pub fn request(&mut self, config: GenerationConfig) {
        self.pending = Some(config);
    }

    /// Resolves the pending request. Free runs skip the provider; paid runs
    /// hand the config out only when the provider reports success, leaving
    /// the gate locked on failure so the user can retry or cancel.
    pub fn confirm<P: PaymentProvider>(
        &mut self,
        provider: &P,
        trial_used: bool,
    ) -> Result<GateOutcome> {
        if self.pending.is_none() {
            return Ok(GateOutcome::NothingPending);
        }

        // On payment failure the config stays pending so the user can retry
        // or cancel.
        if self.policy.requires_payment(trial_used) {
            provider
                .collect()
                .map_err(|err| AppError::Payment(err.to_string()))?;
        }

        match self.pending.take() {
            Some(config) => {
                let used_free_trial = self.policy == TrialPolicy::FirstFree && !trial_used;
                Ok(GateOutcome::Admitted { config, used_free_trial })
            }
            None => Ok(GateOutcome::NothingPending),
        }
    }

    /// Discards the pending config; no orchestration starts.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingProvider {
        calls: Cell<usize>,
        succeed: bool,
    }

    impl CountingProvider {
        fn new(succeed: bool) -> Self {
            Self { calls: Cell::new(0), succeed }
        }
    }

    impl PaymentProvider for CountingProvider {
        fn collect(&self) -> Result<()> {
            self.calls.set(self.calls.get() + 1);
            if self.succeed {
                Ok(())
            } else {
                Err(AppError::Payment("card declined".to_string()))
            }
        }
    }

    fn config() -> GenerationConfig {
        GenerationConfig {
            video_url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            additional_context: String::new(),
            reference_images: vec![],
        }
    }

    #[test]
    fn first_generation_bypasses_payment_under_trial_policy() {
        let mut gate = UsageGate::new(TrialPolicy::FirstFree);
        let provider = CountingProvider::new(true);
        gate.request(config());

        let outcome = gate.confirm(&provider, false).unwrap();
        assert_eq!(provider.calls.get(), 0);
        assert!(matches!(outcome, GateOutcome::Admitted { used_free_trial: true, .. }));
        assert!(!gate.is_locked());
    }

    #[test]
    fn second_generation_invokes_the_provider() {
        let mut gate = UsageGate::new(TrialPolicy::FirstFree);
        let provider = CountingProvider::new(true);
        gate.request(config());

        let outcome = gate.confirm(&provider, true).unwrap();
        assert_eq!(provider.calls.get(), 1);
        assert!(matches!(outcome, GateOutcome::Admitted { used_free_trial: false, .. }));
    }

    #[test]
    fn payment_failure_keeps_the_gate_locked() {
        let mut gate = UsageGate::new(TrialPolicy::AlwaysPaid);
        let provider = CountingProvider::new(false);
        gate.request(config());

        assert!(gate.confirm(&provider, true).is_err());
        assert!(gate.is_locked());
    }

    #[test]
    fn cancel_discards_the_pending_config() {
        let mut gate = UsageGate::new(TrialPolicy::AlwaysFree);
        gate.request(config());
        gate.cancel();
        assert!(!gate.is_locked());

        let provider = CountingProvider::new(true);
        assert_eq!(gate.confirm(&provider, false).unwrap(), GateOutcome::NothingPending);
    }

    #[test]
    fn default_policy_is_always_free() {
        let mut gate = UsageGate::default();
        let provider = CountingProvider::new(false);
        gate.request(config());
        // Provider would fail, but it is never consulted.
        assert!(matches!(
            gate.confirm(&provider, true).unwrap(),
            GateOutcome::Admitted { used_free_trial: false, .. }
        ));
    }

    #[test]
    fn policy_parsing() {
        assert_eq!(TrialPolicy::parse("first-free"), Some(TrialPolicy::FirstFree));
        assert_eq!(TrialPolicy::parse("PAID"), Some(TrialPolicy::AlwaysPaid));
        assert_eq!(TrialPolicy::parse("free"), Some(TrialPolicy::AlwaysFree));
        assert_eq!(TrialPolicy::parse("gratis"), None);
    }
}
