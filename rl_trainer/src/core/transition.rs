//! Transition types stored by the experience buffers.
//!
//! A transition is packed into two rows when stored:
//! - the state row `[state_dim]`
//! - the "other" row `[reward, mask, action..., aux...]`

/// Action representation (discrete or continuous).
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Discrete action index
    Discrete(u32),
    /// Continuous action vector
    Continuous(Vec<f32>),
}

impl Action {
    /// Number of floats this action occupies in a packed row.
    pub fn packed_len(&self) -> usize {
        match self {
            Action::Discrete(_) => 1,
            Action::Continuous(a) => a.len(),
        }
    }

    /// Write the action into `out`, which must be exactly `packed_len()` long.
    pub fn write_packed(&self, out: &mut [f32]) {
        match self {
            Action::Discrete(a) => out[0] = *a as f32,
            Action::Continuous(a) => out.copy_from_slice(a),
        }
    }

    /// Discrete index, if this is a discrete action.
    pub fn as_discrete(&self) -> Option<u32> {
        match self {
            Action::Discrete(a) => Some(*a),
            Action::Continuous(_) => None,
        }
    }

    /// Continuous components, if this is a continuous action.
    pub fn as_continuous(&self) -> Option<&[f32]> {
        match self {
            Action::Discrete(_) => None,
            Action::Continuous(a) => Some(a),
        }
    }
}

/// One interaction step as written to a buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Observation the action was taken from
    pub state: Vec<f32>,
    /// Action taken
    pub action: Action,
    /// Reward, already scaled by the caller
    pub reward: f32,
    /// 0.0 if the episode ended on this step, else the discount factor
    pub mask: f32,
    /// Auxiliary per-action values (log-prob or noise) used by on-policy updates
    pub aux: Vec<f32>,
}

impl Transition {
    /// Create a transition without auxiliary values.
    pub fn new(state: Vec<f32>, action: Action, reward: f32, mask: f32) -> Self {
        Self {
            state,
            action,
            reward,
            mask,
            aux: Vec::new(),
        }
    }

    /// Build the transition for a step, deriving the mask from `done`.
    pub fn from_step(
        state: Vec<f32>,
        action: Action,
        reward: f32,
        done: bool,
        gamma: f32,
    ) -> Self {
        let mask = if done { 0.0 } else { gamma };
        Self::new(state, action, reward, mask)
    }

    /// Attach auxiliary values.
    pub fn with_aux(mut self, aux: Vec<f32>) -> Self {
        self.aux = aux;
        self
    }

    /// Check whether this transition ended its episode.
    pub fn done(&self) -> bool {
        self.mask == 0.0
    }

    /// Length of the packed "other" row.
    pub fn other_len(&self) -> usize {
        2 + self.action.packed_len() + self.aux.len()
    }

    /// Pack `[reward, mask, action..., aux...]` into `out`.
    ///
    /// Any tail of `out` beyond `other_len()` is zeroed.
    pub fn write_other(&self, out: &mut [f32]) {
        let action_len = self.action.packed_len();
        out[0] = self.reward;
        out[1] = self.mask;
        self.action.write_packed(&mut out[2..2 + action_len]);
        let aux_end = 2 + action_len + self.aux.len();
        out[2 + action_len..aux_end].copy_from_slice(&self.aux);
        out[aux_end..].fill(0.0);
    }
}
