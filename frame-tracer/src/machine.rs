//! Architecture and machine identifiers recorded in the trace header

use serde::{Deserialize, Serialize};
use std::fmt;

/// Instruction set family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    I386,
}

/// Concrete machine within the architecture family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Machine {
    I386,
    X86_64,
}

/// Architecture/machine pair passed to the sink when a trace is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MachineConfig {
    pub architecture: Architecture,
    pub machine: Machine,
}

impl MachineConfig {
    pub fn new(machine: Machine) -> Self {
        Self {
            architecture: Architecture::I386,
            machine,
        }
    }

    /// Machine matching the build target
    #[cfg(target_arch = "x86")]
    pub fn native() -> Self {
        Self::new(Machine::I386)
    }

    /// Machine matching the build target
    #[cfg(target_arch = "x86_64")]
    pub fn native() -> Self {
        Self::new(Machine::X86_64)
    }
}

impl fmt::Display for MachineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}", self.architecture, self.machine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_config() {
        let config = MachineConfig::new(Machine::X86_64);
        assert_eq!(config.architecture, Architecture::I386);
        assert_eq!(config.to_string(), "I386/X86_64");
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_native_machine() {
        assert_eq!(MachineConfig::native().machine, Machine::X86_64);
    }
}
