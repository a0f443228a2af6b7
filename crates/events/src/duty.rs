use derive_where::derive_where;

use ibft_core_types::{Context, Height, Round, Timeout};

/// A round timer that fired.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimeoutData {
    pub height: Height,
    pub round: Round,
}

impl From<Timeout> for TimeoutData {
    fn from(timeout: Timeout) -> Self {
        Self {
            height: timeout.height,
            round: timeout.round,
        }
    }
}

impl From<TimeoutData> for Timeout {
    fn from(data: TimeoutData) -> Self {
        Timeout::new(data.height, data.round)
    }
}

/// Run consensus for `height` over `value`, with the committee already in use.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub struct Duty<Ctx: Context> {
    pub height: Height,
    pub value: Ctx::Value,
}

impl<Ctx: Context> Duty<Ctx> {
    pub fn new(height: Height, value: Ctx::Value) -> Self {
        Self { height, value }
    }
}

/// Run consensus for `height` over `value`, with a new committee.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub struct CommitteeDuty<Ctx: Context> {
    pub height: Height,
    pub value: Ctx::Value,
    pub committee: Ctx::Committee,
}

impl<Ctx: Context> CommitteeDuty<Ctx> {
    pub fn new(height: Height, value: Ctx::Value, committee: Ctx::Committee) -> Self {
        Self {
            height,
            value,
            committee,
        }
    }
}

/// What can trigger work in the node.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub enum DutyEvent<Ctx: Context> {
    Timeout(TimeoutData),
    ExecuteDuty(Duty<Ctx>),
    ExecuteCommitteeDuty(CommitteeDuty<Ctx>),
}

impl<Ctx: Context> DutyEvent<Ctx> {
    /// The name this event is published under.
    pub const fn name(&self) -> &'static str {
        match self {
            DutyEvent::Timeout(_) => "timeoutData",
            DutyEvent::ExecuteDuty(_) => "executeDuty",
            DutyEvent::ExecuteCommitteeDuty(_) => "executeCommitteeDuty",
        }
    }

    /// The height the event is about.
    pub fn height(&self) -> Height {
        match self {
            DutyEvent::Timeout(data) => data.height,
            DutyEvent::ExecuteDuty(duty) => duty.height,
            DutyEvent::ExecuteCommitteeDuty(duty) => duty.height,
        }
    }
}
