//! Scoped inference mode.
//!
//! Burn has no global "no grad" switch: inference runs on the inner
//! (non-autodiff) backend through [`AutodiffModule::valid`]. An
//! [`InferenceScope`] owns that inner copy for the duration of a block and
//! marks the thread as being in inference mode until it is dropped, so the
//! mode is left on every exit path: normal return, `?` propagation or unwind.
//!
//! ```rust,ignore
//! let scope = InferenceScope::enter::<B, _>(agent.actor());
//! let steps = agent.collect(scope.model(), &mut env, &mut buffer, max_step, scale, gamma)?;
//! drop(scope);
//! ```

use std::cell::Cell;
use std::marker::PhantomData;

use burn::module::AutodiffModule;
use burn::tensor::backend::AutodiffBackend;

thread_local! {
    static INFERENCE_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Whether an [`InferenceScope`] is alive on this thread.
pub fn inference_active() -> bool {
    INFERENCE_DEPTH.with(|depth| depth.get() > 0)
}

/// Guard holding the inference copy of a model.
pub struct InferenceScope<M> {
    model: M,
    // Tied to the thread-local depth counter.
    _not_send: PhantomData<*const ()>,
}

impl<M> InferenceScope<M> {
    /// Enter inference mode with the non-autodiff copy of `model`.
    pub fn enter<B, A>(model: &A) -> Self
    where
        B: AutodiffBackend,
        A: AutodiffModule<B, InnerModule = M>,
    {
        let model = model.valid();
        INFERENCE_DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self {
            model,
            _not_send: PhantomData,
        }
    }

    /// The inference copy.
    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<M> Drop for InferenceScope<M> {
    fn drop(&mut self) {
        INFERENCE_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Run `f` against the inference copy of `model` inside a scope.
pub fn with_inference<B, A, R, F>(model: &A, f: F) -> R
where
    B: AutodiffBackend,
    A: AutodiffModule<B>,
    F: FnOnce(&A::InnerModule) -> R,
{
    let scope = InferenceScope::enter::<B, A>(model);
    f(scope.model())
}
