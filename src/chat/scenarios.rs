//! Fixed example scenarios offered while a session is idle.

use std::fmt;
use std::str::FromStr;

/// One of the three example decisions a user can start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// Relocating for a job.
    Moving,
    /// Picking a college major.
    Education,
    /// Switching careers.
    Career,
}

impl Scenario {
    /// All scenarios in display order.
    pub const ALL: [Scenario; 3] = [Scenario::Moving, Scenario::Education, Scenario::Career];

    /// Button label.
    pub fn label(&self) -> &'static str {
        match self {
            Scenario::Moving => "Moving Decision",
            Scenario::Education => "Education Choice",
            Scenario::Career => "Career Change",
        }
    }

    /// The user message appended when the scenario is picked.
    pub fn prompt(&self) -> &'static str {
        match self {
            Scenario::Moving => {
                "I'm trying to decide whether to move to a new city for a job opportunity. Can you help me think through this decision?"
            }
            Scenario::Education => {
                "I'm having trouble choosing between different college majors. How should I approach this decision?"
            }
            Scenario::Career => {
                "I'm considering changing careers but I'm not sure if it's the right move. Can you help me evaluate this?"
            }
        }
    }

    /// 1-based position in [`Scenario::ALL`].
    pub fn number(&self) -> usize {
        match self {
            Scenario::Moving => 1,
            Scenario::Education => 2,
            Scenario::Career => 3,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Scenario {
    type Err = String;

    /// Accepts the 1-based number or a keyword (`moving`, `education`, `career`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "moving" | "move" => Ok(Scenario::Moving),
            "2" | "education" | "college" | "major" => Ok(Scenario::Education),
            "3" | "career" | "job" => Ok(Scenario::Career),
            other => Err(format!(
                "unknown example {other:?} (use 1-3, moving, education, or career)"
            )),
        }
    }
}
