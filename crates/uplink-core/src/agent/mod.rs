//! Agent identities, display profiles, and runtime status.
//!
//! The set of agents is fixed at compile time. Wire payloads and CLI input
//! refer to an agent by its snake_case key; everything past that boundary
//! works with [`AgentId`].

mod registry;

pub use registry::AgentRegistry;

use serde::{Deserialize, Serialize};
use strum::EnumIter;

/// Identity of a backend agent, one variant per roster entry.
///
/// Serialized as the wire key (`"spacex"`, `"google_adk"`, ...). Iteration
/// order is roster display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    Spacex,
    Weather,
    Summary,
    GoogleAdk,
    System,
}

impl AgentId {
    /// Resolves a wire key to an identity.
    ///
    /// Returns `None` for keys outside the fixed roster; workflow events may
    /// reference agents this client does not know about.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "spacex" => Some(Self::Spacex),
            "weather" => Some(Self::Weather),
            "summary" => Some(Self::Summary),
            "google_adk" => Some(Self::GoogleAdk),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    /// The canonical wire key for this identity.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Spacex => "spacex",
            Self::Weather => "weather",
            Self::Summary => "summary",
            Self::GoogleAdk => "google_adk",
            Self::System => "system",
        }
    }

    /// Display metadata for this identity.
    pub fn profile(&self) -> &'static AgentProfile {
        match self {
            Self::Spacex => &SPACEX_PROFILE,
            Self::Weather => &WEATHER_PROFILE,
            Self::Summary => &SUMMARY_PROFILE,
            Self::GoogleAdk => &GOOGLE_ADK_PROFILE,
            Self::System => &SYSTEM_PROFILE,
        }
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Display metadata for an agent, fixed at process start.
///
/// Messages reference an agent only by [`AgentId`]; name and icon are
/// resolved through this profile at render time, never copied into the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProfile {
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    /// Completes "Ask specific questions about ..." in the focus announcement.
    pub focus_hint: &'static str,
}

static SPACEX_PROFILE: AgentProfile = AgentProfile {
    name: "SpaceX Agent",
    icon: "🚀",
    description: "Handles SpaceX launch data and mission information",
    focus_hint: "SpaceX missions",
};

static WEATHER_PROFILE: AgentProfile = AgentProfile {
    name: "Weather Agent",
    icon: "🌍",
    description: "Provides weather data and forecasts",
    focus_hint: "weather conditions",
};

static SUMMARY_PROFILE: AgentProfile = AgentProfile {
    name: "Summary Agent",
    icon: "📝",
    description: "Creates intelligent summaries and analysis",
    focus_hint: "summaries and analysis",
};

static GOOGLE_ADK_PROFILE: AgentProfile = AgentProfile {
    name: "Google ADK",
    icon: "🧠",
    description: "AI-powered coordination and validation",
    focus_hint: "coordination and validation",
};

static SYSTEM_PROFILE: AgentProfile = AgentProfile {
    name: "System",
    icon: "⚙️",
    description: "System messages and coordination",
    focus_hint: "system status",
};

/// Runtime status of an agent as driven by workflow events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Idle and reachable.
    #[default]
    Online,
    /// Currently executing a workflow step.
    Busy,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => f.write_str("online"),
            Self::Busy => f.write_str("busy"),
        }
    }
}
