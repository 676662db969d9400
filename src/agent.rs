use std::fmt;

use serde::{Deserialize, Serialize};

/// The agent assistants the backend exposes.
///
/// The serialized form (`investment_advisor`, `trading_agent`) is the wire
/// identifier the conversation-creation endpoint expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    InvestmentAdvisor,
    TradingAgent,
}

impl AgentType {
    /// Wire identifier sent to the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::InvestmentAdvisor => "investment_advisor",
            AgentType::TradingAgent => "trading_agent",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AgentType::InvestmentAdvisor => "Investment Advisor",
            AgentType::TradingAgent => "Trading Agent",
        }
    }

    /// Title used when creating a server-side conversation for this agent.
    pub fn default_title(&self) -> String {
        format!("{} Conversation", self.display_name())
    }

    /// Greeting seeded into a fresh transcript before any exchange.
    pub fn welcome_message(&self) -> &'static str {
        match self {
            AgentType::InvestmentAdvisor => {
                "Hello! I'm your Investment Advisor. I can help you with investment \
                 strategies, market analysis, portfolio optimization, and financial \
                 planning. How can I assist you today?"
            }
            AgentType::TradingAgent => {
                "Hello! I'm your Trading Agent. I can help you execute trades on \
                 Binance, monitor your portfolio, and manage your cryptocurrency \
                 investments. What would you like to do?"
            }
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
