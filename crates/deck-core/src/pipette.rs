//! Pipette mounts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which gantry mount a pipette hangs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mount {
    Left,
    Right,
}

impl Mount {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mount::Left => "left",
            Mount::Right => "right",
        }
    }
}

impl fmt::Display for Mount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_serde_casing() {
        assert_eq!(Mount::Left.to_string(), "left");
        let json = serde_json::to_string(&Mount::Right).unwrap();
        assert_eq!(json, "\"right\"");
    }
}
