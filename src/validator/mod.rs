/*!
 * Validator: reviews candidate pages against policy and source of truth.
 *
 * This module provides the second pipeline stage. It consumes the same
 * context the drafter saw, the published page, and the candidate, and
 * resolves every policy question into a structured verdict:
 * - Traceability: no claim without support in the collected context
 * - Structure: well-formed HTML, required sections, manual regions intact
 * - Tone: forbidden vocabulary and promotional language
 * - Policy: summary length bounds
 * - Diff proportionality: change volume vs. actual new signal
 *
 * # Architecture
 *
 * - `structure`: Well-formedness, manual regions, required sections
 * - `tone`: Forbidden and promotional vocabulary
 * - `traceability`: Lexical claim extraction and evidence matching
 * - `diff`: Line-level change measurement
 * - `service`: Orchestrates all checks into a verdict
 */

pub mod diff;
pub mod service;
pub mod structure;
pub mod tone;
pub mod traceability;

// Re-export main types
pub use service::{Validator, Verdict, VerdictStatus};
