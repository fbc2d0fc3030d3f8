//! Test suite for the training control loop.
//!
//! # Test Organization
//!
//! - `trainer_tests`: Construction, termination, off-policy prefill and failure paths
//!
//! # Critical Invariants Tested
//!
//! 1. **Buffer Variant**
//!    - Chosen from the agent's declared policy family
//!    - Sequential buffer reset before every rollout
//!
//! 2. **Termination**
//!    - Checked before every cycle, so a stop file present at start means zero cycles
//!    - Step budget is exceeded strictly
//!
//! 3. **Inference Mode**
//!    - Rollouts and evaluation run inside it, updates outside
//!    - Released on every error path
