use crate::{config::NodeId, core::data_type::ValueType};

/// Reserved condition resolving to the channel watermark.
pub const LAST_READOUT_TOKEN: &str = "lastreadout";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Literal(String),
    LastReadout,
}

impl Condition {
    pub fn from_text(text: &str) -> Self {
        if text.trim().eq_ignore_ascii_case(LAST_READOUT_TOKEN) {
            Condition::LastReadout
        } else {
            Condition::Literal(text.to_string())
        }
    }
}

/// A positional statement parameter of a templated channel.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableConfig {
    pub node: NodeId,
    pub name: String,
    /// 1-based placeholder position.
    pub position: usize,
    pub value_type: ValueType,
    pub condition: Condition,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_readout_token_is_case_insensitive() {
        assert_eq!(Condition::from_text(" LastReadout "), Condition::LastReadout);
        assert_eq!(
            Condition::from_text("42"),
            Condition::Literal("42".to_string())
        );
    }
}
