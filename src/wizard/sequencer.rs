//! Step sequencer: tracks which of the five wizard steps is active and
//! which have been completed.

use serde::{Deserialize, Serialize};

/// The wizard steps, in order.
///
/// Progresses linearly: Personal → Contact → Physical → License → Beneficiary.
/// Serialized as the 1-based step number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Step {
    Personal = 1,
    Contact = 2,
    Physical = 3,
    License = 4,
    Beneficiary = 5,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::Personal,
        Step::Contact,
        Step::Physical,
        Step::License,
        Step::Beneficiary,
    ];

    pub const FIRST: Step = Step::Personal;
    pub const LAST: Step = Step::Beneficiary;

    /// 1-based step number.
    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn from_number(n: u8) -> Option<Step> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    pub fn next(&self) -> Option<Step> {
        Self::from_number(self.number() + 1)
    }

    pub fn prev(&self) -> Option<Step> {
        Self::from_number(self.number().checked_sub(1)?)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Personal => "Personal",
            Self::Contact => "Contact",
            Self::Physical => "Physical",
            Self::License => "License",
            Self::Beneficiary => "Beneficiary",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Personal => "Basic information",
            Self::Contact => "Address and contact details",
            Self::Physical => "Height, weight, and health",
            Self::License => "Driver's license or ID",
            Self::Beneficiary => "Beneficiary designation",
        }
    }
}

impl From<Step> for u8 {
    fn from(step: Step) -> u8 {
        step.number()
    }
}

impl TryFrom<u8> for Step {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Step::from_number(n).ok_or_else(|| format!("step {n} is out of range (1-5)"))
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Set of completed steps, stored as a bitmask (bit `n-1` for step `n`).
///
/// Serialized as a sorted list of step numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<u8>", from = "Vec<u8>")]
pub struct CompletedSteps(u8);

impl CompletedSteps {
    pub fn new() -> Self {
        Self(0)
    }

    fn bit(step: Step) -> u8 {
        1 << (step.number() - 1)
    }

    /// Add a step. Returns `true` if it was not already present.
    pub fn insert(&mut self, step: Step) -> bool {
        let was_present = self.contains(step);
        self.0 |= Self::bit(step);
        !was_present
    }

    pub fn contains(&self, step: Step) -> bool {
        self.0 & Self::bit(step) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Step> + '_ {
        Step::ALL.into_iter().filter(|s| self.contains(*s))
    }

    /// Sorted, de-duplicated step numbers.
    pub fn encode(&self) -> Vec<u8> {
        self.iter().map(|s| s.number()).collect()
    }

    /// Inverse of [`encode`](Self::encode). Numbers outside 1..=5 are dropped.
    pub fn decode(numbers: &[u8]) -> Self {
        let mut set = Self::new();
        for n in numbers {
            match Step::from_number(*n) {
                Some(step) => {
                    set.insert(step);
                }
                None => tracing::warn!(step = n, "Ignoring out-of-range completed step"),
            }
        }
        set
    }
}

impl From<CompletedSteps> for Vec<u8> {
    fn from(set: CompletedSteps) -> Vec<u8> {
        set.encode()
    }
}

impl From<Vec<u8>> for CompletedSteps {
    fn from(numbers: Vec<u8>) -> Self {
        CompletedSteps::decode(&numbers)
    }
}

/// Position in the wizard plus completion history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sequencer {
    current: Step,
    completed: CompletedSteps,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self {
            current: Step::FIRST,
            completed: CompletedSteps::new(),
        }
    }
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a previously persisted position.
    pub fn restore(current: Step, completed: CompletedSteps) -> Self {
        Self { current, completed }
    }

    pub fn current(&self) -> Step {
        self.current
    }

    pub fn completed(&self) -> CompletedSteps {
        self.completed
    }

    /// Whether the active step is the last one; advancing from here submits.
    pub fn is_final(&self) -> bool {
        self.current == Step::LAST
    }

    /// Mark the current step complete and move forward one step.
    /// No-op on the last step.
    pub fn advance(&mut self) -> Option<Step> {
        let next = self.current.next()?;
        self.completed.insert(self.current);
        self.current = next;
        Some(next)
    }

    /// Move back one step. No-op on the first step. Completion is kept.
    pub fn retreat(&mut self) -> Option<Step> {
        let prev = self.current.prev()?;
        self.current = prev;
        Some(prev)
    }

    /// Jump directly to step `n` (progress-indicator click). Completion is kept.
    pub fn jump_to(&mut self, n: u8) -> Option<Step> {
        let target = Step::from_number(n)?;
        self.current = target;
        Some(target)
    }

    pub fn mark_complete(&mut self, step: Step) -> bool {
        self.completed.insert(step)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
