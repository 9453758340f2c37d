//! Action sequences a creature sprite can play.
//!
//! A [`Sequence`] names one animation/action (walking, standing, casting,
//! ...). Each sequence carries a move factor that scales the sprite's base
//! speed: `0` for stationary actions, `1` for walking, `2` for running.

use serde::{Deserialize, Serialize};

/// Named animation/action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sequence {
    Stand,
    StandFidget1,
    StandFidget2,
    Stance,
    StanceFidget1,
    StanceFidget2,
    Ready,
    HeadTurn,
    Walk,
    Run,
    Attack1,
    Attack2,
    Attack3,
    AttackSlash,
    AttackBackslash,
    AttackJab,
    Shoot,
    Cast,
    Cast1,
    Cast2,
    Cast3,
    Cast4,
    Spell,
    Spell1,
    Spell2,
    Spell3,
}

/// Casting sequences; these always recover back to standing or walking.
pub const CAST_SEQUENCES: [Sequence; 5] = [
    Sequence::Cast,
    Sequence::Cast1,
    Sequence::Cast2,
    Sequence::Cast3,
    Sequence::Cast4,
];

/// Curated set sprites explore at random.
pub const EXPLORATION_SEQUENCES: [Sequence; 17] = [
    Sequence::Attack1,
    Sequence::Attack2,
    Sequence::Attack3,
    Sequence::AttackSlash,
    Sequence::AttackBackslash,
    Sequence::AttackJab,
    Sequence::Shoot,
    Sequence::Spell,
    Sequence::Spell1,
    Sequence::Spell2,
    Sequence::Spell3,
    Sequence::Cast,
    Sequence::Stance,
    Sequence::StanceFidget1,
    Sequence::Ready,
    Sequence::HeadTurn,
    Sequence::Run,
];

impl Sequence {
    /// Speed multiplier applied to the sprite's base speed.
    pub const fn move_factor(self) -> f64 {
        match self {
            Sequence::Walk => 1.0,
            Sequence::Run => 2.0,
            _ => 0.0,
        }
    }

    pub const fn is_moving(self) -> bool {
        matches!(self, Sequence::Walk | Sequence::Run)
    }

    pub const fn is_cast(self) -> bool {
        matches!(
            self,
            Sequence::Cast | Sequence::Cast1 | Sequence::Cast2 | Sequence::Cast3 | Sequence::Cast4
        )
    }

    /// Standing/stance idles and their fidgets.
    pub const fn is_idle(self) -> bool {
        matches!(
            self,
            Sequence::Stand
                | Sequence::StandFidget1
                | Sequence::StandFidget2
                | Sequence::Stance
                | Sequence::StanceFidget1
                | Sequence::StanceFidget2
        )
    }

    /// Idle a fidget returns to once it has played, if this is a fidget.
    pub const fn fidget_base(self) -> Option<Sequence> {
        match self {
            Sequence::StandFidget1 | Sequence::StandFidget2 => Some(Sequence::Stand),
            Sequence::StanceFidget1 | Sequence::StanceFidget2 => Some(Sequence::Stance),
            _ => None,
        }
    }
}

/// How an asset's idle animations are organised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationStyle {
    /// Plain stand/walk assets.
    #[default]
    Standard,
    /// Assets with stand/stance fidget sub-states.
    Fidget,
}
