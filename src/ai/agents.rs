use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Agent {
    MarketAnalyst,
    ThreatIntel,
    InvestmentAdvisor,
    DueDiligence,
}

impl Agent {
    pub const ALL: [Agent; 4] = [
        Agent::MarketAnalyst,
        Agent::ThreatIntel,
        Agent::InvestmentAdvisor,
        Agent::DueDiligence,
    ];

    pub fn parse(name: &str) -> Option<Agent> {
        Agent::ALL.into_iter().find(|a| a.slug() == name.trim().to_lowercase())
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Agent::MarketAnalyst => "market-analyst",
            Agent::ThreatIntel => "threat-intel",
            Agent::InvestmentAdvisor => "investment-advisor",
            Agent::DueDiligence => "due-diligence",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            Agent::MarketAnalyst => {
                "You are a cybersecurity market analyst. Explain funding and market trends in the security \
                 industry using the data provided. Be concise and quantitative."
            }
            Agent::ThreatIntel => {
                "You are a threat intelligence analyst. Relate emerging threats and attacker techniques to the \
                 security product categories that address them."
            }
            Agent::InvestmentAdvisor => {
                "You are an advisor to venture investors focused on cybersecurity. Assess opportunities by \
                 category, stage and competitive density. Do not give personalised financial advice."
            }
            Agent::DueDiligence => {
                "You perform due diligence on cybersecurity startups. List strengths, risks and open questions \
                 about the company described, based only on the data provided."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_agent_slugs() {
        assert_eq!(Agent::parse("market-analyst"), Some(Agent::MarketAnalyst));
        assert_eq!(Agent::parse(" Due-Diligence "), Some(Agent::DueDiligence));
        assert_eq!(Agent::parse("fortune-teller"), None);
    }

    #[test]
    fn every_agent_has_a_prompt() {
        for agent in Agent::ALL {
            assert!(!agent.system_prompt().is_empty());
        }
    }
}
