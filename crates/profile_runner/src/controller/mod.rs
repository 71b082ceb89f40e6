//! Controller Module - Ein Convergence-Lauf
//!
//! Dieses Modul enthält den ProfileProvider der den Lauf ausführt:
//! 1. Hole aktuellen Zustand (InstalledProfileSet)
//! 2. Berechne Decision (reconcile)
//! 3. Führe Decision aus
//!
//! Anders als ein Operator-Loop gibt es keine Wiederholung: ein Lauf, ein Kommando.

pub mod executor;
pub mod provider;

pub use executor::{execute_decision, plan_decision, ExecuteResult};
pub use provider::{ConvergeReport, ProfileProvider};
